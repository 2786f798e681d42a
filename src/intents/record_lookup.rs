//! Record lookup: "is this ticket / invoice logged in the system?"

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, snippet};
use crate::frame::{norm_id, CreditFrame, CreditRecord, COL_AMOUNT, COL_INVOICE, COL_TICKET};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TICKET_ID_RE: Regex = Regex::new(r"(?i)\bR-\d{3,}\b").unwrap();
    static ref INVOICE_ID_RE: Regex = Regex::new(r"(?i)\bINV-?\d{4,}\b").unwrap();
    static ref PLAIN_NUMBER_RE: Regex = Regex::new(r"\b\d{6,}\b").unwrap();
}

/// Phrases that signal an existence question.
const EXISTENCE_PHRASES: [&str; 6] = [
    "logged",
    "in the system",
    "on record",
    "on file",
    "do we have",
    "exist",
];

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    if !EXISTENCE_PHRASES.iter().any(|k| q.contains(k)) {
        return false;
    }
    q.contains("ticket") || q.contains("invoice") || q.contains("credit")
}

/// Candidate IDs in the query: ticket style, invoice style (dash stripped),
/// and bare long numbers. First-mention order, deduped.
pub fn extract_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut push = |id: String| {
        if !ids.contains(&id) {
            ids.push(id);
        }
    };

    for m in TICKET_ID_RE.find_iter(raw) {
        push(m.as_str().to_uppercase());
    }
    for m in INVOICE_ID_RE.find_iter(raw) {
        push(m.as_str().to_uppercase().replace('-', ""));
    }
    for m in PLAIN_NUMBER_RE.find_iter(raw) {
        push(m.as_str().to_string());
    }
    ids
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let has_ticket_col = frame.has_column(COL_TICKET);
    let has_invoice_col = frame.has_column(COL_INVOICE);
    if !has_ticket_col && !has_invoice_col {
        return Ok(Some(IntentReply::text(
            "I can't check whether a record is logged because I don't see \
             `Ticket Number` or `Invoice Number` columns in the dataset.",
        )));
    }

    let ids = extract_ids(&query.raw);
    if ids.is_empty() {
        // No ID found, let other intents try.
        return Ok(None);
    }

    let has_amount_col = frame.has_column(COL_AMOUNT);

    let mut lines: Vec<String> = vec![
        "🔍 **Record lookup – is this ticket / invoice logged?**".to_string(),
        String::new(),
    ];

    for rid in &ids {
        let rid_clean = rid.replace("INV", "");
        let matches: Vec<&CreditRecord> = frame
            .records
            .iter()
            .filter(|r| {
                let ticket_hit = has_ticket_col
                    && r.ticket.as_deref().map(norm_id).as_deref() == Some(rid.as_str());
                let invoice_hit = has_invoice_col
                    && r.invoice
                        .as_deref()
                        .map(norm_id)
                        .map(|inv| inv == *rid || inv == rid_clean)
                        .unwrap_or(false);
                ticket_hit || invoice_hit
            })
            .collect();

        if matches.is_empty() {
            lines.push(format!("❌ **{}** — not found in this dataset.", rid));
            continue;
        }

        lines.push(format!("✅ **{}** — found **{}** record(s).", rid, matches.len()));

        if has_amount_col {
            let total: f64 = matches.iter().filter_map(|r| r.amount).sum();
            lines.push(format!(
                "   • Sum of `Credit Request Total`: {}",
                format_money(total)
            ));
        }

        for r in matches.iter().take(3) {
            let mut parts: Vec<String> = Vec::new();
            if let Some(t) = &r.ticket {
                parts.push(format!("Ticket **{}**", t));
            }
            if let Some(inv) = &r.invoice {
                parts.push(format!("Invoice **{}**", inv));
            }
            if let Some(d) = r.date {
                parts.push(format!("Date: {}", d.format("%Y-%m-%d")));
            }
            if let Some(s) = &r.status {
                parts.push(format!("Status: {}", s));
            }
            let header = if parts.is_empty() {
                "Record:".to_string()
            } else {
                parts.join(" | ")
            };

            match r.reason.as_deref().map(|s| snippet(s, 90)) {
                Some(reason) if !reason.is_empty() => {
                    lines.push(format!("   • {} — _{}_", header, reason));
                }
                _ => lines.push(format!("   • {}", header)),
            }
        }

        lines.push(String::new());
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_needs_existence_phrase_and_subject() {
        assert!(triggers(&IntentQuery::new("is ticket R-040699 logged in the system?")));
        assert!(triggers(&IntentQuery::new("do we have invoice 14068709 on record?")));
        assert!(!triggers(&IntentQuery::new("show all tickets for customer YAM")));
        assert!(!triggers(&IntentQuery::new("is my lunch order logged?")));
    }

    #[test]
    fn test_extract_ids() {
        let ids = extract_ids("is ticket R-040699 or invoice INV-14068709 on file? also 123456");
        // bare digit runs inside the ticket/invoice IDs are picked up too,
        // matching the plain-number pattern
        assert_eq!(
            ids,
            vec!["R-040699", "INV14068709", "040699", "14068709", "123456"]
        );
    }
}
