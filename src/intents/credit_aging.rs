//! Credit aging summary: fixed day buckets over open rows, plus a
//! highlight list above a user-tunable threshold.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::{format_money, snippet};
use crate::frame::{CreditFrame, CreditRecord, COL_AMOUNT, COL_DATE};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OVER_DAYS_RE: Regex = Regex::new(r"(?:over|older than)\s+(\d+)\s+day").unwrap();
}

const DEFAULT_HIGHLIGHT_DAYS: i64 = 60;
const MAX_SAMPLE: usize = 20;

/// Fixed aging buckets, right-inclusive and lowest-inclusive:
/// day 7 lands in 0–7, day 8 in 8–15, day 90 in 61–90.
const BUCKET_LABELS: [&str; 6] = ["0–7", "8–15", "16–30", "31–60", "61–90", "90+"];

fn bucket_index(days_open: i64) -> usize {
    match days_open {
        0..=7 => 0,
        8..=15 => 1,
        16..=30 => 2,
        31..=60 => 3,
        61..=90 => 4,
        _ => 5,
    }
}

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    let aging_phrase = q.contains("aging") || q.contains("ageing") || OVER_DAYS_RE.is_match(q);
    aging_phrase && (q.contains("credit") || q.contains("ticket"))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    // "over 60 days" / "older than 45 days" moves the highlight threshold,
    // not the buckets.
    let highlight_threshold = OVER_DAYS_RE
        .captures(&query.lower)
        .and_then(|caps| caps.get(1)?.as_str().parse::<i64>().ok())
        .unwrap_or(DEFAULT_HIGHLIGHT_DAYS);

    if !frame.has_column(COL_DATE) {
        return Ok(Some(IntentReply::text(
            "I can't compute aging without a `Date` column in the dataset.",
        )));
    }

    let open: Vec<(&CreditRecord, i64)> = frame
        .records
        .iter()
        .filter(|r| !r.has_credit_number())
        .filter_map(|r| r.days_open(ctx.today).map(|d| (r, d)))
        .filter(|(_, d)| *d >= 0)
        .collect();

    if open.is_empty() {
        return Ok(Some(IntentReply::text(
            "I don't see any open credits without a `RTN_CR_No` to build an aging summary.",
        )));
    }

    let mut bucket_counts = [0usize; 6];
    for (_, days) in &open {
        bucket_counts[bucket_index(*days)] += 1;
    }

    let mut lines = vec![
        "Here's the **credit aging summary** for open tickets *without* a credit number (RTN_CR_No):"
            .to_string(),
        String::new(),
        "Buckets (days open):".to_string(),
    ];
    for (label, count) in BUCKET_LABELS.iter().zip(bucket_counts.iter()) {
        lines.push(format!("- **{} days**: {} ticket(s)", label, count));
    }

    lines.push(format!(
        "\nTotal open tickets without RTN_CR_No: **{}**",
        open.len()
    ));

    if frame.has_column(COL_AMOUNT) {
        let total: f64 = open.iter().filter_map(|(r, _)| r.amount).sum();
        lines.push(format!(
            "- Sum of `Credit Request Total`: **{}**",
            format_money(total)
        ));
    }

    let mut critical: Vec<(&CreditRecord, i64)> = open
        .iter()
        .filter(|&&(_, d)| d >= highlight_threshold)
        .copied()
        .collect();
    critical.sort_by(|a, b| b.1.cmp(&a.1));

    if !critical.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Oldest tickets (≥ **{}** days open, up to 20 shown):",
            highlight_threshold
        ));
        for (r, days) in critical.iter().take(MAX_SAMPLE) {
            let reason = snippet(
                r.status
                    .as_deref()
                    .or(r.reason.as_deref())
                    .unwrap_or(""),
                160,
            );
            lines.push(format!(
                "- **{}** — Ticket **{}** (Customer **{}**) — *{}* — **{} days open**",
                r.date_display(),
                r.ticket_display(),
                r.customer_display(),
                reason,
                days
            ));
        }
        if critical.len() > MAX_SAMPLE {
            lines.push(format!(
                "...and **{}** more ticket(s) in that range.",
                critical.len() - MAX_SAMPLE
            ));
        }
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("show the credit aging summary")));
        assert!(triggers(&IntentQuery::new("show credits over 60 days")));
        assert!(triggers(&IntentQuery::new("tickets older than 45 days")));
        assert!(!triggers(&IntentQuery::new("what's aging in the warehouse?")));
    }

    #[test]
    fn test_buckets_partition_day_counts() {
        // no overlap, no gap across the whole non-negative range
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(7), 0);
        assert_eq!(bucket_index(8), 1);
        assert_eq!(bucket_index(15), 1);
        assert_eq!(bucket_index(16), 2);
        assert_eq!(bucket_index(30), 2);
        assert_eq!(bucket_index(31), 3);
        assert_eq!(bucket_index(60), 3);
        assert_eq!(bucket_index(61), 4);
        assert_eq!(bucket_index(90), 4);
        assert_eq!(bucket_index(91), 5);
        for d in 0..200 {
            let hits = (0..6).filter(|i| bucket_index(d) == *i).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_threshold_parse() {
        let q = IntentQuery::new("show credits over 45 days");
        let t = OVER_DAYS_RE
            .captures(&q.lower)
            .and_then(|c| c.get(1).unwrap().as_str().parse::<i64>().ok());
        assert_eq!(t, Some(45));
    }
}
