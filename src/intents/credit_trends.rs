//! Credit trends: the last 30 days against the 30 before them, anchored
//! at the newest date in the table.

use super::{top_groups_by_sum, HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::format_money;
use crate::frame::{
    CreditFrame, CreditRecord, COL_CUSTOMER, COL_DATE, COL_ITEM, COL_SALES_REP,
};
use chrono::{Days, NaiveDate};

const TREND_PHRASES: [&str; 5] = [
    "trend",
    "pattern",
    "insight",
    "what's happening",
    "whats happening",
];

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    TREND_PHRASES.iter().any(|k| q.contains(k)) && (q.contains("credit") || q.contains("ticket"))
}

fn in_window(r: &CreditRecord, start: NaiveDate, end: NaiveDate) -> bool {
    r.date.map(|d| d >= start && d <= end).unwrap_or(false)
}

fn amount_or_zero(r: &CreditRecord) -> f64 {
    r.amount.unwrap_or(0.0)
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if !frame.has_column(COL_DATE) {
        return Ok(Some(IntentReply::text(
            "I can't analyze credit trends because the `Date` column is missing.",
        )));
    }

    let latest = match frame.records.iter().filter_map(|r| r.date).max() {
        Some(d) => d,
        None => {
            return Ok(Some(IntentReply::text(
                "I don't have enough dated records to analyze trends.",
            )))
        }
    };

    let cutoff_30 = latest - Days::new(30);
    let cutoff_prev = cutoff_30 - Days::new(30);
    let prev_end = cutoff_30 - Days::new(1);

    let last_30: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| in_window(r, cutoff_30, latest))
        .collect();
    let prev_30: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| in_window(r, cutoff_prev, prev_end))
        .collect();

    if last_30.is_empty() || prev_30.is_empty() {
        return Ok(Some(IntentReply::text(
            "I don't have enough data in the last 60 days to compare \
             the last 30 days vs the previous 30.",
        )));
    }

    let n_last = last_30.len() as i64;
    let n_prev = prev_30.len() as i64;
    let diff_n = n_last - n_prev;
    // percentage denominators floor at 1 so an empty-ish window never
    // divides by zero
    let pct_n = (diff_n as f64 / n_prev.max(1) as f64) * 100.0;

    let amt_last: f64 = last_30.iter().map(|r| amount_or_zero(r)).sum();
    let amt_prev: f64 = prev_30.iter().map(|r| amount_or_zero(r)).sum();
    let diff_amt = amt_last - amt_prev;
    let pct_amt = (diff_amt / amt_prev.max(1.0)) * 100.0;

    let mut lines = vec![
        "📊 **Credit Trends – Last 30 vs Previous 30 Days**".to_string(),
        format!("- Previous 30 days: **{} → {}**", cutoff_prev, prev_end),
        format!("- Last 30 days: **{} → {}**", cutoff_30, latest),
        String::new(),
        format!(
            "📈 **Volume:** {} rows vs {} rows (Δ {:+}, {:+.1}% change).",
            n_last, n_prev, diff_n, pct_n
        ),
        format!(
            "💲 **Total credits:** {} vs {} (Δ {}, {:+.1}% change).",
            format_money(amt_last),
            format_money(amt_prev),
            format_money(diff_amt),
            pct_amt
        ),
        String::new(),
    ];

    let group_lines = |records: &[&CreditRecord],
                       field: fn(&CreditRecord) -> Option<&str>|
     -> Vec<(String, f64)> {
        top_groups_by_sum(
            records.iter().map(|r| {
                (
                    field(r).unwrap_or("UNKNOWN").to_string(),
                    amount_or_zero(r),
                )
            }),
            5,
        )
    };

    if frame.has_column(COL_CUSTOMER) {
        let top = group_lines(&last_30, |r| r.customer.as_deref());
        if !top.is_empty() {
            lines.push("🏷️ **Top customers in the last 30 days:**".to_string());
            for (cust, val) in top {
                lines.push(format!("- {}: {} in credits", cust, format_money(val)));
            }
            lines.push(String::new());
        }
    }

    if frame.has_column(COL_ITEM) {
        let top = group_lines(&last_30, |r| r.item.as_deref());
        if !top.is_empty() {
            lines.push("📦 **Top items in the last 30 days:**".to_string());
            for (item, val) in top {
                lines.push(format!("- Item {}: {} in credits", item, format_money(val)));
            }
            lines.push(String::new());
        }
    }

    if frame.has_column(COL_SALES_REP) {
        let top = group_lines(&last_30, |r| r.sales_rep.as_deref());
        if !top.is_empty() {
            lines.push("🧑‍💼 **Top sales reps in the last 30 days:**".to_string());
            for (rep, val) in top {
                lines.push(format!("- {}: {} in credits", rep, format_money(val)));
            }
            lines.push(String::new());
        }
    }

    lines.push(
        "📝 **Summary:** This view is meant as a conversation starter for leadership – \
         volume, dollars, and who/what (customers, items, and sales reps) \
         is driving the most credits."
            .to_string(),
    );

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("are there any credit trends worth sharing?")));
        assert!(triggers(&IntentQuery::new("any recent patterns in tickets?")));
        assert!(!triggers(&IntentQuery::new("any trends in the weather?")));
    }
}
