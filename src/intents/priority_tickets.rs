//! Priority tickets: open rows (no credit number) at least 15 days old,
//! oldest first.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::snippet;
use crate::frame::{CreditFrame, CreditRecord, COL_DATE};
use chrono::Days;

const PRIORITY_AGE_DAYS: u64 = 15;
const MAX_SAMPLE: usize = 20;

pub fn triggers(query: &IntentQuery) -> bool {
    query.lower.contains("priority") && query.lower.contains("ticket")
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if !frame.has_column(COL_DATE) {
        return Ok(Some(IntentReply::text(
            "I can't compute priority tickets because there is no `Date` column in the dataset.",
        )));
    }

    let dated: Vec<&CreditRecord> = frame.records.iter().filter(|r| r.date.is_some()).collect();
    if dated.is_empty() {
        return Ok(Some(IntentReply::text(
            "I don't see any tickets with a valid `Date`, so I can't compute priorities yet.",
        )));
    }

    let open: Vec<&CreditRecord> = dated
        .into_iter()
        .filter(|r| !r.has_credit_number())
        .collect();
    if open.is_empty() {
        return Ok(Some(IntentReply::text(
            "Nice! Every ticket with a valid date already has a credit number. \
             No pending priority tickets.",
        )));
    }

    let cutoff = ctx.today - Days::new(PRIORITY_AGE_DAYS);
    let mut priority: Vec<&CreditRecord> = open
        .into_iter()
        .filter(|r| r.date.map(|d| d <= cutoff).unwrap_or(false))
        .collect();

    if priority.is_empty() {
        return Ok(Some(IntentReply::text(format!(
            "I don't see any tickets older than {} days without a credit number. \
             Oldest open tickets are still within the {}-day window.",
            PRIORITY_AGE_DAYS, PRIORITY_AGE_DAYS
        ))));
    }

    // Oldest first.
    priority.sort_by(|a, b| a.date.cmp(&b.date));

    let total = priority.len();
    let mut lines = vec![
        format!(
            "Here are **priority tickets** without a credit number (RTN_CR_No), older than **{} days**:",
            PRIORITY_AGE_DAYS
        ),
        format!("- Total priority tickets: **{}**", total),
        String::new(),
        "Oldest tickets first (top 20):".to_string(),
    ];

    for r in priority.iter().take(MAX_SAMPLE) {
        let days_open = r.days_open(ctx.today).unwrap_or(0);
        lines.push(format!(
            "- **{}** — Ticket **{}** (Customer **{}**) — *{}* — **{} days open**",
            r.date_display(),
            r.ticket_display(),
            r.customer_display(),
            snippet(r.status.as_deref().unwrap_or("N/A"), 160),
            days_open
        ));
    }

    if total > MAX_SAMPLE {
        lines.push(format!(
            "...and **{}** more priority ticket(s).",
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
        assert!(triggers(&IntentQuery::new("what tickets are priority right now?")));
        assert!(!triggers(&IntentQuery::new("what are my priorities?")));
    }
}
