//! RTN/credit-number summary: rows that already carry a `RTN_CR_No`.

use super::{HandlerResult, IntentQuery, IntentReply, QueryContext};
use crate::format::is_absent;
use crate::frame::{CreditFrame, CreditRecord, COL_RTN};

const MAX_SAMPLE: usize = 20;

pub fn triggers(query: &IntentQuery) -> bool {
    let q = &query.lower;
    q.contains("credit number")
        || q.contains("rtn_cr_no")
        || (q.contains("rtn") && q.contains("credit"))
}

pub fn handle(query: &IntentQuery, frame: &CreditFrame, _ctx: &QueryContext) -> HandlerResult {
    if !triggers(query) {
        return Ok(None);
    }

    if !frame.has_column(COL_RTN) {
        return Ok(Some(IntentReply::text(
            "I can't find the `RTN_CR_No` column in the dataset.",
        )));
    }

    let mut with_rtn: Vec<&CreditRecord> = frame
        .records
        .iter()
        .filter(|r| !is_absent(r.rtn_cr_no.as_deref()))
        .collect();

    if with_rtn.is_empty() {
        return Ok(Some(IntentReply::text(
            "I don't see any credits with a populated `RTN_CR_No` yet.",
        )));
    }

    with_rtn.sort_by(|a, b| b.date.cmp(&a.date));

    let mut lines = vec![
        format!(
            "I currently see **{}** credit request(s) with a non-empty **RTN_CR_No**.",
            with_rtn.len()
        ),
        String::new(),
        "Here are some of the most recent ones:".to_string(),
    ];

    for r in with_rtn.iter().take(MAX_SAMPLE) {
        lines.push(format!(
            "- **{}** — Customer **{}**, Invoice **{}**, Ticket **{}**, Credit Number (RTN_CR_No): **{}**",
            r.date_display(),
            r.customer_display(),
            r.invoice.as_deref().unwrap_or("N/A"),
            r.ticket_display(),
            r.rtn_cr_no.as_deref().unwrap_or("N/A")
        ));
    }

    if with_rtn.len() > MAX_SAMPLE {
        lines.push(format!(
            "...and **{}** more record(s) with a credit number.",
            with_rtn.len() - MAX_SAMPLE
        ));
    }

    Ok(Some(IntentReply::text(lines.join("\n"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers() {
        assert!(triggers(&IntentQuery::new("how many credits have a credit number?")));
        assert!(triggers(&IntentQuery::new("which credits have RTNs?")));
        assert!(triggers(&IntentQuery::new("show records with RTN_CR_No")));
        assert!(!triggers(&IntentQuery::new("show me the RTN list")));
    }
}
