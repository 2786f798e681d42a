//! Ticket status: a textual summary for one ticket, no subtable.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, normalize, snippet};
use crate::frame::{CreditFrame, CreditRecord, COL_TICKET};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TICKET_RE: Regex = Regex::new(r"(?i)\bR-\d+\b").unwrap();
}

const MAX_ROWS: usize = 20;

pub fn triggers(query: &IntentQuery) -> bool {
    TICKET_RE.is_match(&query.raw)
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let ticket = match TICKET_RE.find(&query.raw) {
        Some(m) => normalize(m.as_str()),
        None => return Ok(None),
    };

    if !frame.has_column(COL_TICKET) {
        return Ok(Some(IntentReply::text(
            "I can't look up ticket status because the `Ticket Number` column is missing.",
        )));
    }

    let rows: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| r.ticket.as_deref().map(normalize).as_deref() == Some(ticket.as_str()))
        .collect();

    if rows.is_empty() {
        return Ok(Some(IntentReply::text(format!(
            "I couldn't find a record for ticket **{}**.",
            ticket
        ))));
    }

    let first_seen = rows.iter().filter_map(|r| r.date).min();
    let first_seen_str = match first_seen {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "Unknown date".to_string(),
    };
    let total: f64 = rows.iter().filter_map(|r| r.amount).sum();

    let mut lines = vec![
        format!("Absolutely. Here's what I see for **ticket {}**:", ticket),
        format!("- First seen: **{}**", first_seen_str),
        format!("- Records: **{}**", rows.len()),
        format!("- Total credit: **{}**", format_money(total)),
        String::new(),
    ];

    for r in rows.iter().take(MAX_ROWS) {
        let status = snippet(r.status.as_deref().unwrap_or("N/A"), 120);
        lines.push(format!(
            "- **{}** — Customer **{}**, Invoice **{}**, Item **{}** — *{}*",
            r.date_display(),
            r.customer_display(),
            r.invoice.as_deref().unwrap_or("N/A"),
            r.item.as_deref().unwrap_or("N/A"),
            status
        ));
    }

    if rows.len() > MAX_ROWS {
        lines.push(format!("...and **{}** more record(s).", rows.len() - MAX_ROWS));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("status on ticket R-048484")));
        assert!(!triggers(&IntentQuery::new("give me a credit overview")));
    }

    #[test]
    fn test_handle_defers_without_ticket_pattern() {
        use polars::prelude::*;

        let df = df![ "Ticket Number" => ["R-1"] ].unwrap();
        let frame = crate::frame::CreditFrame::new(&df).unwrap();
        let ctx = QueryContext {
            today: chrono::NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
        };
        let reply = handle(&IntentQuery::new("give me a credit overview"), &frame, &ctx).unwrap();
        assert!(reply.is_none());
    }
}
