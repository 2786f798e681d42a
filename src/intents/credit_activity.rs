//! Credit activity in a date window, keyed off the update timestamps
//! embedded in `Status`.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::dates::resolve_window;
use crate::format::format_money;
use crate::frame::{CreditFrame, CreditRecord, COL_AMOUNT, COL_TICKET};

const MAX_SAMPLE: usize = 10;

pub fn triggers(query: &IntentQuery) -> bool {
    query.lower.contains("credit") && query.lower.contains("update")
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    // No resolvable window means this is some other credit question.
    let (start, end) = match resolve_window(&query.clean, ctx.today) {
        Some(window) => window,
        None => return Ok(None),
    };

    let mut subset: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| match r.update_ts {
            Some(ts) => {
                let d = ts.date();
                d >= start && d <= end
            }
            None => false,
        })
        .collect();

    if subset.is_empty() {
        return Ok(Some(IntentReply::text(format!(
            "I don't see any timestamped credit updates between **{}** and **{}**.",
            start, end
        ))));
    }

    let total_records = subset.len();

    let unique_tickets = if frame.has_column(COL_TICKET) {
        let mut tickets: Vec<&str> = subset.iter().filter_map(|r| r.ticket.as_deref()).collect();
        tickets.sort_unstable();
        tickets.dedup();
        Some(tickets.len())
    } else {
        None
    };

    let mut lines = vec![
        format!("For this period (**{}** to **{}**), I see:", start, end),
        format!(
            "- **{}** credit request record(s) with timestamped updates",
            total_records
        ),
    ];
    if let Some(n) = unique_tickets {
        lines.push(format!("- **{}** unique ticket(s) updated", n));
    }
    if frame.has_column(COL_AMOUNT) {
        let total: f64 = subset.iter().filter_map(|r| r.amount).sum();
        lines.push(format!(
            "- Total `Credit Request Total`: **{}**",
            format_money(total)
        ));
    }

    lines.push(String::new());
    lines.push("Most recent updates in that range:".to_string());

    subset.sort_by(|a, b| b.update_ts.cmp(&a.update_ts));
    for r in subset.iter().take(MAX_SAMPLE) {
        lines.push(format!(
            "- **{}** — Ticket **{}** — {}",
            r.update_ts_display(),
            r.ticket_display(),
            r.status.as_deref().unwrap_or("")
        ));
    }

    if total_records > MAX_SAMPLE {
        lines.push(format!(
            "...and **{}** more update record(s).",
            total_records - MAX_SAMPLE
        ));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("how many credits did I update last 7 days?")));
        assert!(triggers(&IntentQuery::new("credits updated this month")));
        assert!(!triggers(&IntentQuery::new("show me updates")));
        assert!(!triggers(&IntentQuery::new("show me credits")));
    }
}
