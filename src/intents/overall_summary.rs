//! Overall credit overview: dataset totals, open exposure, and
//! month-to-date activity.

use super::{top_groups_by_sum, HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::dates::month_start;
use crate::format::{format_money, format_money_opt};
use crate::frame::{CreditFrame, CreditRecord, COL_AMOUNT, COL_CUSTOMER, COL_DATE};

const SUMMARY_PHRASES: [&str; 6] = [
    "summary",
    "overview",
    "picture",
    "status",
    "how are credits",
    "credit overview",
];

pub fn triggers(query: &IntentQuery) -> bool {
    SUMMARY_PHRASES.iter().any(|k| query.lower.contains(k))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    let has_amount = frame.has_column(COL_AMOUNT);
    let total_records = frame.records.len();
    let total_amount_str = if has_amount {
        format_money(frame.records.iter().filter_map(|r| r.amount).sum())
    } else {
        "N/A".to_string()
    };

    let open: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| !r.has_credit_number())
        .collect();
    let open_amount_str = if has_amount {
        format_money(open.iter().filter_map(|r| r.amount).sum())
    } else {
        "N/A".to_string()
    };

    let this_month_start = month_start(ctx.today);
    let mut month: Vec<&CreditRecord> = if frame.has_column(COL_DATE) {
        frame
            .records
            .iter()
            .filter(|r| {
                r.date
                    .map(|d| d >= this_month_start && d <= ctx.today)
                    .unwrap_or(false)
            })
            .collect()
    } else {
        Vec::new()
    };
    let month_amount_str = if has_amount {
        format_money(month.iter().filter_map(|r| r.amount).sum())
    } else {
        "N/A".to_string()
    };

    let mut lines = vec![
        "📊 **Overall Credit Overview**".to_string(),
        String::new(),
        format!("- Total records in dataset: **{}**", total_records),
        format!("- Total `Credit Request Total`: **{}**", total_amount_str),
        String::new(),
        "🧾 **Open tickets without a credit number (RTN_CR_No)**".to_string(),
        format!("- Count: **{}**", open.len()),
        format!("- Sum of `Credit Request Total`: **{}**", open_amount_str),
        String::new(),
        format!("📅 **This month ({} → {})**", this_month_start, ctx.today),
        format!("- Credit records: **{}**", month.len()),
        format!("- Sum of `Credit Request Total`: **{}**", month_amount_str),
    ];

    if !month.is_empty() && frame.has_column(COL_CUSTOMER) {
        let top_customers = top_groups_by_sum(
            month.iter().filter_map(|r| {
                let cust = r.customer.clone()?;
                Some((cust, r.amount.unwrap_or(0.0)))
            }),
            5,
        );
        if !top_customers.is_empty() {
            lines.push(String::new());
            lines.push("🏢 **Top customers by credit this month**".to_string());
            for (cust, amt) in top_customers {
                lines.push(format!("- **{}** — {} this month", cust, format_money(amt)));
            }
        }
    }

    if !month.is_empty() {
        lines.push(String::new());
        lines.push("🕒 **Most recent credits this month (up to 5):**".to_string());
        month.sort_by(|a, b| b.date.cmp(&a.date));
        for r in month.iter().take(5) {
            lines.push(format!(
                "- **{}** — Ticket **{}**, Customer **{}**, Amount: {}",
                r.date_display(),
                r.ticket_display(),
                r.customer_display(),
                format_money_opt(r.amount, r.amount_raw.as_deref())
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
        assert!(triggers(&IntentQuery::new("give me a credit overview")));
        assert!(triggers(&IntentQuery::new("summary of open credits")));
        assert!(triggers(&IntentQuery::new("what's the current credit picture?")));
        assert!(!triggers(&IntentQuery::new("hello")));
    }
}
