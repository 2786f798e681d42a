//! Credit anomalies: large and statistically extreme amounts inside the
//! trailing 90 days.

use super::{top_groups_by_sum, HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::format_money;
use crate::frame::{
    CreditFrame, CreditRecord, COL_AMOUNT, COL_CUSTOMER, COL_DATE, COL_ITEM, COL_SALES_REP,
};
use chrono::Days;

const ANOMALY_PHRASES: [&str; 5] = ["anomal", "unusual", "suspicious", "outlier", "weird"];

/// Both thresholds are inclusive: a $500.00 amount at z = 3.0 is flagged.
const AMOUNT_THRESHOLD: f64 = 500.0;
const Z_THRESHOLD: f64 = 3.0;
const MAX_DETAIL_ROWS: usize = 15;

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    ANOMALY_PHRASES.iter().any(|k| q.contains(k)) && (q.contains("credit") || q.contains("ticket"))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if !frame.has_column(COL_DATE) || !frame.has_column(COL_AMOUNT) {
        return Ok(Some(IntentReply::text(
            "I can't run anomaly detection because I need both `Date` and \
             `Credit Request Total` columns.",
        )));
    }

    let latest = match frame.records.iter().filter_map(|r| r.date).max() {
        Some(d) => d,
        None => {
            return Ok(Some(IntentReply::text(
                "I don't have any dated records to run anomaly detection.",
            )))
        }
    };

    let cutoff = latest - Days::new(90);
    let recent: Vec<(&CreditRecord, f64)> = frame
        .records
        .iter()
        .filter(|r| r.date.map(|d| d >= cutoff && d <= latest).unwrap_or(false))
        .map(|r| (r, r.amount.unwrap_or(0.0)))
        .collect();

    if recent.is_empty() {
        return Ok(Some(IntentReply::text(
            "There are no credit records in the last 90 days to analyze.",
        )));
    }

    let n = recent.len() as f64;
    let mean: f64 = recent.iter().map(|(_, a)| a).sum::<f64>() / n;
    // sample standard deviation over the 90-day population
    let sigma = if recent.len() < 2 {
        0.0
    } else {
        let var = recent
            .iter()
            .map(|(_, a)| (a - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        var.sqrt()
    };

    if sigma == 0.0 || !sigma.is_finite() {
        return Ok(Some(IntentReply::text(
            "All recent credits are roughly the same size – no clear anomalies.",
        )));
    }

    let mut anomalies: Vec<(&CreditRecord, f64, f64)> = recent
        .iter()
        .map(|(r, a)| (*r, *a, (a - mean) / sigma))
        .filter(|(_, a, z)| a.abs() >= AMOUNT_THRESHOLD && z.abs() >= Z_THRESHOLD)
        .collect();

    if anomalies.is_empty() {
        return Ok(Some(IntentReply::text(format!(
            "I don't see any large, statistically unusual credits in the last 90 days \
             (amount ≥ {}, |z| ≥ {}).",
            format_money(AMOUNT_THRESHOLD),
            Z_THRESHOLD
        ))));
    }

    let total_amount: f64 = anomalies.iter().map(|(_, a, _)| a).sum();

    let mut lines = vec![
        "🚨 **Credit Anomaly Scan – Last 90 Days**".to_string(),
        format!("- Window analyzed: **{} → {}**", cutoff, latest),
        format!(
            "- Anomalous credits found: **{}** totalling **{}**",
            anomalies.len(),
            format_money(total_amount)
        ),
        format!(
            "- Rule: amount ≥ {}, |z-score| ≥ {:.1}",
            format_money(AMOUNT_THRESHOLD),
            Z_THRESHOLD
        ),
        String::new(),
    ];

    let grouped = |field: fn(&CreditRecord) -> Option<&str>| -> Vec<(String, f64)> {
        top_groups_by_sum(
            anomalies
                .iter()
                .map(|(r, a, _)| (field(r).unwrap_or("UNKNOWN").to_string(), *a)),
            5,
        )
    };

    if frame.has_column(COL_CUSTOMER) {
        lines.push("👥 **Top customers with anomalous credits:**".to_string());
        for (cust, val) in grouped(|r| r.customer.as_deref()) {
            lines.push(format!("- {}: {} in anomalies", cust, format_money(val)));
        }
        lines.push(String::new());
    }

    if frame.has_column(COL_ITEM) {
        lines.push("📦 **Top items with anomalous credits:**".to_string());
        for (item, val) in grouped(|r| r.item.as_deref()) {
            lines.push(format!("- Item {}: {} in anomalies", item, format_money(val)));
        }
        lines.push(String::new());
    }

    if frame.has_column(COL_SALES_REP) {
        lines.push("🧑‍💼 **Top sales reps with anomalous credits:**".to_string());
        for (rep, val) in grouped(|r| r.sales_rep.as_deref()) {
            lines.push(format!("- {}: {} in anomalies", rep, format_money(val)));
        }
        lines.push(String::new());
    }

    // Most extreme first.
    anomalies.sort_by(|a, b| {
        b.2.abs()
            .partial_cmp(&a.2.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    lines.push("🔍 **Most extreme anomalous credits (top 15 by |z-score|):**".to_string());
    for (r, amount, z) in anomalies.iter().take(MAX_DETAIL_ROWS) {
        lines.push(format!(
            "- **{}** — Ticket **{}** | Cust **{}** | Item **{}** | Rep **{}** — Amount: {} (z = {:+.2})",
            r.date_display(),
            r.ticket_display(),
            r.customer_display(),
            r.item.as_deref().unwrap_or("N/A"),
            r.sales_rep.as_deref().unwrap_or("N/A"),
            format_money(*amount),
            z
        ));
    }

    lines.push(
        "\n📝 **Use case:** This view is perfect for weekly risk reviews – it surfaces a \
         short list of unusually large credits by customer, item, and rep."
            .to_string(),
    );

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("any unusual or suspicious credits lately?")));
        assert!(triggers(&IntentQuery::new("show credit outliers")));
        assert!(!triggers(&IntentQuery::new("anything weird going on?")));
    }
}
