//! Top accounts: customers ranked by credit dollars, then ticket count.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, is_absent};
use crate::frame::{CreditFrame, COL_AMOUNT, COL_RTN, COL_TICKET};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

const SUPERLATIVES: [&str; 4] = ["most", "top", "highest", "biggest"];
const ISSUED_PHRASES: [&str; 3] = ["issued", "with credit number", "have credit numbers"];

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    (q.contains("account") || q.contains("customer"))
        && q.contains("credit")
        && SUPERLATIVES.iter().any(|w| q.contains(w))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if frame.customer_col.is_none() {
        return Ok(Some(IntentReply::text(
            "I couldn't identify a customer/account column \
             (looked for 'Customer', 'Customer Number', etc.), \
             so I can't rank accounts by credits.",
        )));
    }

    if !frame.has_column(COL_AMOUNT) {
        return Ok(Some(IntentReply::text(
            "I don't see a `Credit Request Total` column, so I can't compute \
             which accounts have the most credits.",
        )));
    }

    // Soft filter: "issued" restricts to rows with a credit number when the
    // RTN column exists; without that column we keep all credit rows.
    let issued_only = ISSUED_PHRASES.iter().any(|w| query.lower.contains(w))
        && frame.has_column(COL_RTN);

    let has_ticket_col = frame.has_column(COL_TICKET);

    struct Group {
        tickets: HashSet<String>,
        rows: usize,
        total: f64,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for record in &frame.records {
        let amount = match record.amount {
            Some(a) if a != 0.0 => a,
            _ => continue,
        };
        if issued_only && is_absent(record.rtn_cr_no.as_deref()) {
            continue;
        }
        let key = match frame.customer_key(record) {
            Some(k) => k,
            None => continue,
        };
        let group = groups.entry(key).or_insert_with(|| Group {
            tickets: HashSet::new(),
            rows: 0,
            total: 0.0,
        });
        group.rows += 1;
        group.total += amount;
        if let Some(t) = &record.ticket {
            group.tickets.insert(t.clone());
        }
    }

    if groups.is_empty() {
        return Ok(Some(IntentReply::text(
            "I don't see any credit records I can use to rank accounts.",
        )));
    }

    let ranked: Vec<(String, usize, f64)> = groups
        .into_iter()
        .map(|(key, g)| {
            let count = if has_ticket_col { g.tickets.len() } else { g.rows };
            (key, count, g.total)
        })
        .sorted_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.0.cmp(&b.0))
        })
        .collect();

    let mut lines = vec![
        "Here are the **accounts/customers with the most credits** \
         (ranked by total `Credit Request Total`):"
            .to_string(),
        format!("- Total accounts in ranking: **{}**", ranked.len()),
        String::new(),
        "Top accounts (up to 10):".to_string(),
    ];

    for (cust, count, total) in ranked.iter().take(10) {
        let label = if cust.trim().is_empty() { "Unknown" } else { cust.as_str() };
        lines.push(format!(
            "- **{}** — **{}** ticket(s), total credits **{}**",
            label,
            count,
            format_money(*total)
        ));
    }

    if ranked.len() > 10 {
        lines.push(format!(
            "...and **{}** more account(s) below.",
            ranked.len() - 10
        ));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_needs_all_three_signals() {
        assert!(triggers(&IntentQuery::new("which accounts have the most credits?")));
        assert!(triggers(&IntentQuery::new("top customers by credit dollars")));
        assert!(!triggers(&IntentQuery::new("which accounts have credits?")));
        assert!(!triggers(&IntentQuery::new("top accounts by revenue")));
    }
}
