//! Ticket detail: every row for a ticket, with the matching subtable.
//!
//! Runs before `ticket_status` in the registry; both match the same `R-`
//! pattern but this one exposes the full subtable.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, normalize};
use crate::frame::{CreditFrame, COL_TICKET};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TICKET_RE: Regex = Regex::new(r"(?i)\bR-\d+\b").unwrap();
}

pub fn triggers(query: &IntentQuery) -> bool {
    TICKET_RE.is_match(&query.raw)
}

/// Ticket IDs mentioned in the query, uppercased, first-mention order.
pub fn extract_tickets(query: &IntentQuery) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for m in TICKET_RE.find_iter(&query.raw) {
        let id = normalize(m.as_str());
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let ticket_ids = extract_tickets(query);
    if ticket_ids.is_empty() {
        return Ok(None);
    }

    if !frame.has_column(COL_TICKET) {
        return Ok(Some(IntentReply::text(
            "I can't find ticket details because the `Ticket Number` column is missing.",
        )));
    }

    let mut lines: Vec<String> = Vec::new();
    let mut matched_rows: Vec<usize> = Vec::new();

    for tid in &ticket_ids {
        let subset: Vec<_> = frame
            .records
            .iter()
            .filter(|r| r.ticket.as_deref().map(normalize).as_deref() == Some(tid.as_str()))
            .collect();

        if subset.is_empty() {
            lines.push(format!("❌ No records found for **{}**.", tid));
            continue;
        }

        let total: f64 = subset.iter().filter_map(|r| r.amount).sum();
        matched_rows.extend(subset.iter().map(|r| r.row));

        lines.push(format!(
            "📄 **Found {} record(s) for ticket {}.**\n- Sum of `Credit Request Total`: {}\nDisplaying full table below 👇",
            subset.len(),
            tid,
            format_money(total)
        ));
    }

    let text = lines.join("\n\n");
    if matched_rows.is_empty() {
        return Ok(Some(IntentReply::text(text)));
    }

    let table = frame.subtable(&matched_rows)?;
    Ok(Some(IntentReply::with_table(text, table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_on_ticket_pattern() {
        assert!(triggers(&IntentQuery::new("show everything for R-040699")));
        assert!(triggers(&IntentQuery::new("status on ticket r-5")));
        assert!(!triggers(&IntentQuery::new("show everything for customer YAM")));
    }

    #[test]
    fn test_extract_tickets_dedupes_in_order() {
        let q = IntentQuery::new("compare r-100 with R-200 and R-100 again");
        assert_eq!(extract_tickets(&q), vec!["R-100", "R-200"]);
    }
}
