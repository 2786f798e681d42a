//! Per-request view over the credit export table.
//!
//! Every `route` call builds one `CreditFrame` from the caller's
//! `DataFrame`. The frame owns typed copies of the logical columns
//! (dates coerced, amounts parsed, update timestamps extracted from
//! `Status`) and never writes back to the source table.

use crate::error::Result;
use crate::format::{is_absent, normalize};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;

pub const COL_TICKET: &str = "Ticket Number";
pub const COL_CUSTOMER: &str = "Customer Number";
pub const COL_ITEM: &str = "Item Number";
pub const COL_SALES_REP: &str = "Sales Rep";
pub const COL_INVOICE: &str = "Invoice Number";
pub const COL_DATE: &str = "Date";
pub const COL_STATUS: &str = "Status";
pub const COL_RTN: &str = "RTN_CR_No";
pub const COL_AMOUNT: &str = "Credit Request Total";
pub const COL_REASON: &str = "Reason for Credit";
pub const COL_UPDATE_TS: &str = "Update Timestamp";

/// Customer-like columns, tried in order when ranking accounts.
const CUSTOMER_COLUMN_CANDIDATES: [&str; 6] = [
    "Customer Number",
    "Customer",
    "Customer Code",
    "Customer ID",
    "Cust #",
    "Cust",
];

/// Item-like columns, tried in order when ranking items.
const ITEM_COLUMN_CANDIDATES: [&str; 6] = [
    "Item Number",
    "Item",
    "Item ID",
    "Item Code",
    "Item #",
    "ItemNum",
];

lazy_static! {
    /// Bracketed event timestamp embedded in `Status` text.
    static ref STATUS_TIMESTAMP_RE: Regex =
        Regex::new(r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").unwrap();
}

/// Phrases in `Status` that count as evidence a credit number was issued.
const CREDIT_EVIDENCE_PHRASES: [&str; 3] = ["CREDIT NUMBER", "CREDIT REQUEST NO", "RTNCM"];

/// One row of the export, with every optional field already coerced.
#[derive(Debug, Clone)]
pub struct CreditRecord {
    /// Row index into the source `DataFrame`, used to carve subtables.
    pub row: usize,
    pub ticket: Option<String>,
    pub customer: Option<String>,
    pub item: Option<String>,
    pub sales_rep: Option<String>,
    pub invoice: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub rtn_cr_no: Option<String>,
    pub amount: Option<f64>,
    pub amount_raw: Option<String>,
    pub reason: Option<String>,
    pub update_ts: Option<NaiveDateTime>,
}

impl CreditRecord {
    pub fn days_open(&self, today: NaiveDate) -> Option<i64> {
        self.date.map(|d| (today - d).num_days())
    }

    pub fn days_since_update(&self, today: NaiveDate) -> Option<i64> {
        self.update_ts.map(|ts| (today - ts.date()).num_days())
    }

    /// The OR-composed credit-number rule: a row counts as having a credit
    /// number when `RTN_CR_No` is non-sentinel, or when the `Status` text
    /// carries credit-number evidence. Open-ness everywhere is the negation
    /// of this single predicate.
    pub fn has_credit_number(&self) -> bool {
        if !is_absent(self.rtn_cr_no.as_deref()) {
            return true;
        }
        match &self.status {
            Some(status) => {
                let upper = status.to_uppercase();
                CREDIT_EVIDENCE_PHRASES.iter().any(|p| upper.contains(p))
            }
            None => false,
        }
    }

    pub fn ticket_display(&self) -> &str {
        self.ticket.as_deref().unwrap_or("N/A")
    }

    pub fn customer_display(&self) -> &str {
        self.customer.as_deref().unwrap_or("N/A")
    }

    pub fn date_display(&self) -> String {
        match self.date {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => "Unknown date".to_string(),
        }
    }

    pub fn update_ts_display(&self) -> String {
        match self.update_ts {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "Unknown time".to_string(),
        }
    }
}

/// Typed snapshot of the table for one request.
pub struct CreditFrame<'a> {
    pub df: &'a DataFrame,
    pub records: Vec<CreditRecord>,
    pub customer_col: Option<String>,
    pub item_col: Option<String>,
}

impl<'a> CreditFrame<'a> {
    pub fn new(df: &'a DataFrame) -> Result<Self> {
        let height = df.height();

        let tickets = column_as_strings(df, COL_TICKET)?;
        let customers = column_as_strings(df, COL_CUSTOMER)?;
        let items = column_as_strings(df, COL_ITEM)?;
        let reps = column_as_strings(df, COL_SALES_REP)?;
        let invoices = column_as_strings(df, COL_INVOICE)?;
        let dates = column_as_strings(df, COL_DATE)?;
        let statuses = column_as_strings(df, COL_STATUS)?;
        let rtns = column_as_strings(df, COL_RTN)?;
        let amounts = column_as_strings(df, COL_AMOUNT)?;
        let reasons = column_as_strings(df, COL_REASON)?;
        let explicit_ts = column_as_strings(df, COL_UPDATE_TS)?;

        let cell = |col: &Option<Vec<Option<String>>>, i: usize| -> Option<String> {
            col.as_ref().and_then(|v| v.get(i).cloned().flatten())
        };

        let mut records = Vec::with_capacity(height);
        for i in 0..height {
            let status = cell(&statuses, i);
            let update_ts = match cell(&explicit_ts, i) {
                Some(raw) => parse_datetime(&raw),
                None => status.as_deref().and_then(extract_status_timestamp),
            };
            let amount_raw = cell(&amounts, i);
            records.push(CreditRecord {
                row: i,
                ticket: cell(&tickets, i),
                customer: cell(&customers, i),
                item: cell(&items, i),
                sales_rep: cell(&reps, i),
                invoice: cell(&invoices, i),
                date: cell(&dates, i).as_deref().and_then(parse_date),
                status,
                rtn_cr_no: cell(&rtns, i),
                amount: amount_raw.as_deref().and_then(parse_amount),
                amount_raw,
                reason: cell(&reasons, i),
                update_ts,
            });
        }

        Ok(Self {
            df,
            records,
            customer_col: resolve_column(df, &CUSTOMER_COLUMN_CANDIDATES),
            item_col: resolve_column(df, &ITEM_COLUMN_CANDIDATES),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| *c == name)
    }

    /// Group-by value for the resolved customer-like column.
    pub fn customer_key(&self, record: &CreditRecord) -> Option<String> {
        match self.customer_col.as_deref() {
            Some(COL_CUSTOMER) | None => record.customer.clone(),
            Some(col) => cell_string(self.df, col, record.row),
        }
    }

    /// Group-by value for the resolved item-like column.
    pub fn item_key(&self, record: &CreditRecord) -> Option<String> {
        match self.item_col.as_deref() {
            Some(COL_ITEM) | None => record.item.clone(),
            Some(col) => cell_string(self.df, col, record.row),
        }
    }

    /// Carve a subtable out of the source table from row indices.
    pub fn subtable(&self, rows: &[usize]) -> Result<DataFrame> {
        let wanted: std::collections::HashSet<usize> = rows.iter().copied().collect();
        let mask: BooleanChunked = (0..self.df.height())
            .map(|i| Some(wanted.contains(&i)))
            .collect();
        Ok(self.df.filter(&mask)?)
    }
}

/// Read any column as trimmed strings; absent column yields `None`,
/// blank cells yield `None` per value.
fn column_as_strings(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let series = match df.column(name) {
        Ok(s) => s,
        Err(_) => return Ok(None),
    };
    let casted = series.cast(&DataType::String)?;
    let str_col = casted.str()?;
    let values = str_col
        .into_iter()
        .map(|opt| {
            opt.and_then(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        })
        .collect();
    Ok(Some(values))
}

fn cell_string(df: &DataFrame, col: &str, row: usize) -> Option<String> {
    let series = df.column(col).ok()?;
    let casted = series.cast(&DataType::String).ok()?;
    let str_col = casted.str().ok()?;
    str_col.get(row).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn resolve_column(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    let names = df.get_column_names();
    for candidate in candidates {
        if names.iter().any(|n| n == candidate) {
            return Some((*candidate).to_string());
        }
    }
    None
}

/// Parse a calendar date out of a cell. Unparsable values become `None`,
/// never "today".
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y", "%Y/%m/%d"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    parse_datetime(s).map(|dt| dt.date())
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Parse a dollar amount. Unparsable values are excluded (`None`) rather
/// than erroring, matching the export's malformed cells.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pull the bracketed `[YYYY-MM-DD HH:MM:SS]` event time out of `Status`.
pub fn extract_status_timestamp(status: &str) -> Option<NaiveDateTime> {
    let caps = STATUS_TIMESTAMP_RE.captures(status)?;
    parse_datetime(caps.get(1)?.as_str())
}

/// Normalized ID comparison helper used by the lookup handlers.
pub fn norm_id(value: &str) -> String {
    normalize(value).replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df![
            COL_TICKET => ["R-040699", "R-048484", "R-048484"],
            COL_CUSTOMER => ["YAM01", "YAM33", "BOS02"],
            COL_DATE => ["2025-01-01", "bad-date", "2025-03-15"],
            COL_STATUS => [
                "waiting on warehouse [2025-01-05 10:30:00]",
                "Credit Number issued RTNCM0031274",
                "",
            ],
            COL_RTN => ["", "NAN", "CR-9912"],
            COL_AMOUNT => ["250.00", "oops", "75.5"],
        ]
        .unwrap()
    }

    #[test]
    fn test_frame_coercion() {
        let df = sample_df();
        let frame = CreditFrame::new(&df).unwrap();
        assert_eq!(frame.records.len(), 3);

        let first = &frame.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(first.amount, Some(250.0));
        assert_eq!(
            first.update_ts,
            Some(
                NaiveDate::from_ymd_opt(2025, 1, 5)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap()
            )
        );

        let second = &frame.records[1];
        assert_eq!(second.date, None);
        assert_eq!(second.amount, None);
        assert_eq!(second.update_ts, None);
    }

    #[test]
    fn test_credit_number_rule_or_composition() {
        let df = sample_df();
        let frame = CreditFrame::new(&df).unwrap();
        // no RTN, no status evidence
        assert!(!frame.records[0].has_credit_number());
        // sentinel RTN but status mentions RTNCM
        assert!(frame.records[1].has_credit_number());
        // real RTN value
        assert!(frame.records[2].has_credit_number());
    }

    #[test]
    fn test_subtable_selects_rows() {
        let df = sample_df();
        let frame = CreditFrame::new(&df).unwrap();
        let sub = frame.subtable(&[1, 2]).unwrap();
        assert_eq!(sub.height(), 2);
    }

    #[test]
    fn test_missing_columns_tolerated() {
        let df = df![ "Something Else" => ["x"] ].unwrap();
        let frame = CreditFrame::new(&df).unwrap();
        assert_eq!(frame.records.len(), 1);
        assert!(frame.records[0].ticket.is_none());
        assert!(frame.customer_col.is_none());
        assert!(frame.item_col.is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("250.00"), Some(250.0));
        assert_eq!(parse_amount(" 75.5 "), Some(75.5));
        assert_eq!(parse_amount("$250.00"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-01-01"), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(parse_date("03/15/2025"), NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(
            parse_date("2025-01-01 08:00:00"),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(parse_date("not a date"), None);
    }
}
