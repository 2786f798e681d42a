//! Stalled tickets: open rows whose last status update is older than a
//! threshold.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::snippet;
use crate::frame::{CreditFrame, CreditRecord, COL_STATUS, COL_UPDATE_TS};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DAYS_RE: Regex = Regex::new(r"(\d+)\s+day").unwrap();
}

const DEFAULT_STALLED_DAYS: i64 = 7;
const MAX_SAMPLE: usize = 20;

const STALL_PHRASES: [&str; 7] = [
    "stalled",
    "no recent update",
    "no updates",
    "not updated",
    "haven't been updated",
    "haven\u{2019}t been updated",
    "no movement",
];

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    STALL_PHRASES.iter().any(|k| q.contains(k)) && (q.contains("ticket") || q.contains("credit"))
}

/// The middle and upper bucket boundaries stay fixed at 15/30 days even
/// when the caller raises the threshold; only the first bucket follows it.
fn stall_bucket(days_since_update: i64, threshold: i64) -> usize {
    if days_since_update <= threshold + 7 {
        0
    } else if days_since_update <= 30 {
        1
    } else {
        2
    }
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let stalled_days = DAYS_RE
        .captures(&query.lower)
        .and_then(|caps| caps.get(1)?.as_str().parse::<i64>().ok())
        .unwrap_or(DEFAULT_STALLED_DAYS);

    if !frame.has_column(COL_UPDATE_TS) && !frame.has_column(COL_STATUS) {
        return Ok(Some(IntentReply::text(
            "I can't detect stalled tickets because I don't see an \
             `Update Timestamp` column or a `Status` column with timestamps.",
        )));
    }

    let mut stalled: Vec<(&CreditRecord, i64)> = frame
        .records
        .iter()
        .filter(|r| !r.has_credit_number())
        .filter_map(|r| r.days_since_update(ctx.today).map(|d| (r, d)))
        .filter(|(_, d)| *d >= stalled_days)
        .collect();

    if stalled.is_empty() {
        return Ok(Some(IntentReply::text(format!(
            "I don't see any open tickets without RTN_CR_No that have been \
             stalled for **{}+** days.",
            stalled_days
        ))));
    }

    let mut bucket_counts = [0usize; 3];
    for (_, d) in &stalled {
        bucket_counts[stall_bucket(*d, stalled_days)] += 1;
    }

    let total = stalled.len();
    let mut lines = vec![
        format!(
            "Here are **stalled tickets** (no credit number, no updates for **{}+ days**):",
            stalled_days
        ),
        format!("- Total stalled tickets: **{}**", total),
        String::new(),
        "Stall buckets (days since last update):".to_string(),
        format!(
            "- **{}–{} days**: {} ticket(s)",
            stalled_days,
            stalled_days + 7,
            bucket_counts[0]
        ),
        format!("- **15–30 days**: {} ticket(s)", bucket_counts[1]),
        format!("- **30+ days**: {} ticket(s)", bucket_counts[2]),
        String::new(),
        "Most stalled tickets first (top 20):".to_string(),
    ];

    // Quietest first: days since update, then days open, both descending.
    stalled.sort_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| {
            b.0.days_open(ctx.today)
                .unwrap_or(i64::MIN)
                .cmp(&a.0.days_open(ctx.today).unwrap_or(i64::MIN))
        })
    });

    for (r, days_since) in stalled.iter().take(MAX_SAMPLE) {
        let days_open_note = match r.days_open(ctx.today) {
            Some(d) => format!(", **{} days open**", d),
            None => String::new(),
        };
        lines.push(format!(
            "- **{}** — Ticket **{}** (Customer **{}**) — *{}* — **{} days since last update**{}",
            r.update_ts_display(),
            r.ticket_display(),
            r.customer_display(),
            snippet(r.status.as_deref().unwrap_or(""), 160),
            days_since,
            days_open_note
        ));
    }

    if total > MAX_SAMPLE {
        lines.push(format!(
            "...and **{}** more stalled ticket(s).",
            total - MAX_SAMPLE
        ));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("which tickets haven't been updated in 7 days?")));
        assert!(triggers(&IntentQuery::new("show stalled credits")));
        assert!(triggers(&IntentQuery::new("any tickets with no movement?")));
        assert!(!triggers(&IntentQuery::new("anything stalled in shipping?")));
    }

    #[test]
    fn test_stall_buckets_keep_fixed_upper_boundaries() {
        // default threshold: 7–14, 15–30, 30+
        assert_eq!(stall_bucket(7, 7), 0);
        assert_eq!(stall_bucket(14, 7), 0);
        assert_eq!(stall_bucket(15, 7), 1);
        assert_eq!(stall_bucket(30, 7), 1);
        assert_eq!(stall_bucket(31, 7), 2);
        // raised threshold widens the first bucket but 30 stays the ceiling
        // of the middle one
        assert_eq!(stall_bucket(21, 14), 0);
        assert_eq!(stall_bucket(22, 14), 1);
        assert_eq!(stall_bucket(30, 14), 1);
        assert_eq!(stall_bucket(31, 14), 2);
    }
}
