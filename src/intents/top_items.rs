//! Top items: same ranking shape as top accounts, grouped by the
//! item-like column.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, is_absent};
use crate::frame::{CreditFrame, COL_AMOUNT, COL_RTN, COL_TICKET};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

const SUPERLATIVES: [&str; 4] = ["most", "top", "highest", "biggest"];
const ISSUED_PHRASES: [&str; 3] = ["issued", "with credit number", "have credit numbers"];
const ITEM_WORDS: [&str; 4] = ["item", "sku", "product", "products"];

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    ITEM_WORDS.iter().any(|w| q.contains(w))
        && q.contains("credit")
        && SUPERLATIVES.iter().any(|w| q.contains(w))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if frame.item_col.is_none() {
        return Ok(Some(IntentReply::text(
            "I couldn't identify an item column \
             (looked for 'Item Number', 'Item', 'Item ID', etc.), \
             so I can't rank items by credits.",
        )));
    }

    if !frame.has_column(COL_AMOUNT) {
        return Ok(Some(IntentReply::text(
            "I don't see a `Credit Request Total` column, so I can't compute \
             which items have the most credits.",
        )));
    }

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
        let key = match frame.item_key(record) {
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
            "I don't see any credit records I can use to rank items.",
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
        "Here are the **items with the most credits** \
         (ranked by total `Credit Request Total`):"
            .to_string(),
        format!("- Total items in ranking: **{}**", ranked.len()),
        String::new(),
        "Top items (up to 10):".to_string(),
    ];

    for (item, count, total) in ranked.iter().take(10) {
        let label = if item.trim().is_empty() { "Unknown" } else { item.as_str() };
        lines.push(format!(
            "- **{}** — **{}** ticket(s), total credits **{}**",
            label,
            count,
            format_money(*total)
        ));
    }

    if ranked.len() > 10 {
        lines.push(format!("...and **{}** more item(s) below.", ranked.len() - 10));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("which items have the most credits issued?")));
        assert!(triggers(&IntentQuery::new("show top credited products by credit dollars")));
        assert!(!triggers(&IntentQuery::new("which customers have the most credits?")));
    }
}
