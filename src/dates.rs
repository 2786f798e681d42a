//! Date-window derivation from query phrasing.
//!
//! Turns phrases like "from nov 1st to today", "last 7 days" or
//! "this month" into an inclusive `(start, end)` pair anchored at the
//! query's midnight-normalized "today".

use chrono::{Datelike, Days, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PUNCT_RE: Regex = Regex::new(r"[?!,\.]").unwrap();
    static ref FROM_TO_TODAY_RE: Regex = Regex::new(r"from\s+(.+?)\s+to\s+today").unwrap();
    static ref MONTH_DAY_RE: Regex = Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|sept|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{1,2})(?:st|nd|rd|th)?(?:\s+(\d{4}))?\b"
    )
    .unwrap();
    static ref DAY_MONTH_RE: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|sept|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)(?:\s+(\d{4}))?\b"
    )
    .unwrap();
}

/// Strip sentence punctuation so "today?" matches "today".
pub fn clean_query(q_low: &str) -> String {
    PUNCT_RE.replace_all(q_low, " ").to_string()
}

/// Resolve a `(start, end)` window from the cleaned lowercase query.
/// `None` means no window phrase was found and the handler should defer.
pub fn resolve_window(q_clean: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let end = today;

    // Explicit range: "from <date> to today"
    if let Some(caps) = FROM_TO_TODAY_RE.captures(q_clean) {
        if let Some(start) = parse_fuzzy_date(caps.get(1)?.as_str().trim(), today) {
            return Some((start, end));
        }
    }

    if q_clean.contains("last 7") || q_clean.contains("last seven") || q_clean.contains("last week")
    {
        return Some((today - Days::new(7), end));
    }
    if q_clean.contains("last 30")
        || q_clean.contains("last thirty")
        || q_clean.contains("last month")
    {
        return Some((today - Days::new(30), end));
    }
    if q_clean.contains("this month") {
        return Some((month_start(today), end));
    }

    None
}

/// First day of `today`'s month.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
}

/// Loose date parse for user-typed dates. A missing year defaults to the
/// current year.
pub fn parse_fuzzy_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    if let Some(caps) = MONTH_DAY_RE.captures(s) {
        let month = month_number(caps.get(1)?.as_str())?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;
        let year: i32 = match caps.get(3) {
            Some(y) => y.as_str().parse().ok()?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DAY_MONTH_RE.captures(s) {
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month = month_number(caps.get(2)?.as_str())?;
        let year: i32 = match caps.get(3) {
            Some(y) => y.as_str().parse().ok()?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
    }

    #[test]
    fn test_from_date_to_today() {
        let q = clean_query("how many credits did i update from nov 1st to today?");
        let (start, end) = resolve_window(&q, today()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(end, today());
    }

    #[test]
    fn test_relative_windows() {
        let (start, _) = resolve_window("credits updated last 7 days", today()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 11, 13).unwrap());

        let (start, _) = resolve_window("credits updated last month", today()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());

        let (start, _) = resolve_window("credits updated this month", today()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
    }

    #[test]
    fn test_no_window() {
        assert!(resolve_window("credits updated recently", today()).is_none());
    }

    #[test]
    fn test_parse_fuzzy_date() {
        assert_eq!(
            parse_fuzzy_date("november 3", today()),
            NaiveDate::from_ymd_opt(2025, 11, 3)
        );
        assert_eq!(
            parse_fuzzy_date("3rd of march 2024", today()),
            NaiveDate::from_ymd_opt(2024, 3, 3)
        );
        assert_eq!(
            parse_fuzzy_date("2025-06-30", today()),
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
        assert_eq!(parse_fuzzy_date("gibberish", today()), None);
    }
}
