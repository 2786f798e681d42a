//! Formatting and normalization helpers shared by every intent handler.

/// Format a numeric value as `$1,234.56`.
pub fn format_money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let whole = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;
    // carry when cents round up to 100
    let (whole, cents) = if cents >= 100 { (whole + 1, 0) } else { (whole, cents) };

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${}.{:02}", grouped, cents)
    } else {
        format!("${}.{:02}", grouped, cents)
    }
}

/// Format an optional amount, falling back to the raw cell text when the
/// value never parsed, and `N/A` when the cell was empty.
pub fn format_money_opt(val: Option<f64>, raw: Option<&str>) -> String {
    match val {
        Some(v) => format_money(v),
        None => match raw {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => "N/A".to_string(),
        },
    }
}

/// Normalize a string for ID comparison: trim and uppercase.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Sentinel strings that all mean "no value" in the credit export.
const ABSENT_SENTINELS: [&str; 4] = ["NAN", "NONE", "NULL", "NA"];

/// True when a cell should be treated as empty. This is the single place
/// the sentinel-null encoding of the export is interpreted.
pub fn is_absent(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(s) => {
            let norm = normalize(s);
            norm.is_empty() || ABSENT_SENTINELS.contains(&norm.as_str())
        }
    }
}

/// Collapse newlines and cap a free-text snippet for one-line rendering.
pub fn snippet(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ").trim().to_string();
    if flat.chars().count() > max_len {
        let cut: String = flat.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.56), "$1,234.56");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(250.0), "$250.00");
        assert_eq!(format_money(-1234567.891), "-$1,234,567.89");
        assert_eq!(format_money(999.995), "$1,000.00");
    }

    #[test]
    fn test_format_money_opt_falls_back_to_raw() {
        assert_eq!(format_money_opt(Some(5.0), None), "$5.00");
        assert_eq!(format_money_opt(None, Some("pending")), "pending");
        assert_eq!(format_money_opt(None, Some("  ")), "N/A");
        assert_eq!(format_money_opt(None, None), "N/A");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  r-040699 "), "R-040699");
        assert_eq!(normalize("yam01"), "YAM01");
    }

    #[test]
    fn test_is_absent_sentinels() {
        assert!(is_absent(None));
        assert!(is_absent(Some("")));
        assert!(is_absent(Some("  ")));
        assert!(is_absent(Some("nan")));
        assert!(is_absent(Some("None")));
        assert!(is_absent(Some("NULL")));
        assert!(is_absent(Some("na")));
        assert!(!is_absent(Some("RTNCM0031274")));
        assert!(!is_absent(Some("0")));
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("a\nb", 10), "a b");
        assert_eq!(snippet("abcdefghij", 5), "ab...");
    }
}
