//! Customer ticket history: prefix + contains matching on the customer
//! number, with an optional trailing day window.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, format_money_opt, normalize};
use crate::frame::{CreditFrame, CreditRecord, COL_AMOUNT, COL_CUSTOMER, COL_DATE};
use chrono::Days;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CUSTOMER_TOKEN_RE: Regex =
        Regex::new(r"(?i)customer(?:\s+number)?\s+([A-Za-z0-9_-]+)").unwrap();
}

const MAX_SAMPLE: usize = 15;
const MAX_CUSTOMER_DISPLAY: usize = 10;

pub fn triggers(query: &IntentQuery) -> bool {
    query.lower.contains("customer") && query.lower.contains("ticket")
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let token = match CUSTOMER_TOKEN_RE.captures(&query.raw) {
        Some(caps) => normalize(caps.get(1).map(|m| m.as_str()).unwrap_or("")),
        None => {
            return Ok(Some(IntentReply::text(
                "I heard 'customer', but I couldn't detect which one. \
                 Try: `show all tickets for customer YAM`.",
            )))
        }
    };

    if !frame.has_column(COL_CUSTOMER) {
        return Ok(Some(IntentReply::text(
            "I can't find a `Customer Number` column in the dataset.",
        )));
    }

    // Optional trailing day window.
    let days: Option<u64> = if query.lower.contains("last 15") {
        Some(15)
    } else if query.lower.contains("last 30") {
        Some(30)
    } else {
        None
    };

    let window = match days {
        Some(d) if frame.has_column(COL_DATE) => {
            Some((ctx.today - Days::new(d), ctx.today))
        }
        _ => None,
    };

    let mut subset: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| {
            let cust = match &r.customer {
                Some(c) => normalize(c),
                None => return false,
            };
            // prefix & contains, so YAM matches YAM01, YAM33, ...
            if !(cust.starts_with(token.as_str()) || cust.contains(token.as_str())) {
                return false;
            }
            match window {
                Some((start, end)) => match r.date {
                    Some(d) => d >= start && d <= end,
                    None => false,
                },
                None => true,
            }
        })
        .collect();

    if subset.is_empty() {
        let text = match days {
            Some(d) => format!(
                "I don't see any tickets for customers matching **'{}'** in the last {} days.",
                token, d
            ),
            None => format!(
                "I don't see any tickets in the database for customers matching **'{}'**.",
                token
            ),
        };
        return Ok(Some(IntentReply::text(text)));
    }

    // Most recent first; undated rows sink to the bottom.
    subset.sort_by(|a, b| b.date.cmp(&a.date));

    let total_tickets = subset.len();
    let total_credits: f64 = subset.iter().filter_map(|r| r.amount).sum();
    let total_credits_str = if frame.has_column(COL_AMOUNT) {
        format_money(total_credits)
    } else {
        "N/A".to_string()
    };

    let mut distinct: Vec<String> = Vec::new();
    for r in &subset {
        if let Some(c) = &r.customer {
            let norm = normalize(c);
            if !distinct.contains(&norm) {
                distinct.push(norm);
            }
        }
    }
    let mut cust_display = distinct
        .iter()
        .take(MAX_CUSTOMER_DISPLAY)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if distinct.len() > MAX_CUSTOMER_DISPLAY {
        cust_display.push_str(&format!(", ... (+{} more)", distinct.len() - MAX_CUSTOMER_DISPLAY));
    }

    let window_note = match days {
        Some(d) => format!(" in the last {} days", d),
        None => String::new(),
    };

    let mut lines = vec![
        format!(
            "Here's what I found for customers matching **'{}'**{}:",
            token, window_note
        ),
        format!("- Matching customer numbers: **{}**", cust_display),
        format!("- Tickets: **{}**", total_tickets),
        format!("- Sum of `Credit Request Total`: **{}**", total_credits_str),
        String::new(),
        "Sample of recent tickets (most recent first):".to_string(),
    ];

    for r in subset.iter().take(MAX_SAMPLE) {
        lines.push(format!(
            "- **{}** — Customer **{}**, Ticket **{}**, Status: *{}*, Credit: {}",
            r.date_display(),
            r.customer_display(),
            r.ticket_display(),
            r.status.as_deref().unwrap_or("N/A"),
            format_money_opt(r.amount, r.amount_raw.as_deref())
        ));
    }

    if subset.len() > MAX_SAMPLE {
        lines.push(format!("...and **{}** more ticket(s).", subset.len() - MAX_SAMPLE));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_needs_both_words() {
        assert!(triggers(&IntentQuery::new("show all tickets for customer YAM")));
        assert!(!triggers(&IntentQuery::new("show all tickets")));
        assert!(!triggers(&IntentQuery::new("who is customer YAM")));
    }

    #[test]
    fn test_token_extraction() {
        let caps = CUSTOMER_TOKEN_RE
            .captures("show all tickets for customer number yam01")
            .unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "yam01");
    }
}
