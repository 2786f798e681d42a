//! The intent handlers.
//!
//! Each handler is a pure function of `(query, frame, ctx)`. It declines a
//! query by returning `Ok(None)`, answers with `Ok(Some(reply))`, and only
//! returns `Err` for genuinely unexpected faults (the router converts those
//! into a visible error message). Every handler exposes its trigger
//! predicate separately from its compute logic so trigger coverage can be
//! tested on its own.

use crate::error::Result;
use crate::frame::CreditFrame;
use chrono::NaiveDate;
use polars::prelude::DataFrame;

pub mod credit_activity;
pub mod credit_aging;
pub mod credit_anomalies;
pub mod credit_numbers;
pub mod credit_trends;
pub mod customer_tickets;
pub mod overall_summary;
pub mod priority_tickets;
pub mod record_lookup;
pub mod stalled_tickets;
pub mod ticket_detail;
pub mod ticket_status;
pub mod top_accounts;
pub mod top_items;

/// User query, pre-lowered and punctuation-cleaned once per request.
#[derive(Debug, Clone)]
pub struct IntentQuery {
    pub raw: String,
    pub lower: String,
    pub clean: String,
}

impl IntentQuery {
    pub fn new(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        let clean = crate::dates::clean_query(&lower);
        Self {
            raw: raw.to_string(),
            lower,
            clean,
        }
    }
}

/// Per-request context. `today` is the moment of the query normalized to
/// midnight; the router fills it in, tests pin it.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    pub today: NaiveDate,
}

/// What a handler hands back: answer text plus an optional subtable.
#[derive(Debug)]
pub struct IntentReply {
    pub text: String,
    pub table: Option<DataFrame>,
}

impl IntentReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
        }
    }

    pub fn with_table(text: impl Into<String>, table: DataFrame) -> Self {
        Self {
            text: text.into(),
            table: Some(table),
        }
    }
}

pub type HandlerResult = Result<Option<IntentReply>>;

pub type HandlerFn = fn(&IntentQuery, &CreditFrame, &QueryContext) -> HandlerResult;

/// Group-and-sum ranking shared by the summary, trend and anomaly
/// handlers: highest dollar sum first, key as the tie-break so output is
/// stable across calls.
pub(crate) fn top_groups_by_sum(
    entries: impl Iterator<Item = (String, f64)>,
    limit: usize,
) -> Vec<(String, f64)> {
    use std::collections::BTreeMap;

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (key, value) in entries {
        *sums.entry(key).or_insert(0.0) += value;
    }
    let mut ranked: Vec<(String, f64)> = sums.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_groups_by_sum_orders_and_truncates() {
        let entries = vec![
            ("B".to_string(), 10.0),
            ("A".to_string(), 5.0),
            ("B".to_string(), 5.0),
            ("C".to_string(), 15.0),
        ];
        let ranked = top_groups_by_sum(entries.into_iter(), 2);
        assert_eq!(ranked, vec![("B".to_string(), 15.0), ("C".to_string(), 15.0)]);
    }
}
