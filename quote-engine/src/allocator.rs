//! Quote number allocation
//!
//! Quote numbers are `YYMMDD-NNN`: the UTC quote date followed by a per-day
//! sequence starting at 1. Numbers are allocated optimistically by the store
//! (read the day's maximum, insert `max + 1`) and the unique constraints
//! decide which concurrent writer wins; the loser retries.

use chrono::NaiveDate;

/// Highest sequence that still fits the three-digit suffix
pub const MAX_DAILY_SEQ: i32 = 999;

/// Total insert attempts before giving up on a contended day
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

/// Next sequence after the current maximum, `None` once the day is full
pub fn next_daily_seq(current_max: Option<i32>) -> Option<i32> {
    let next = current_max.unwrap_or(0).max(0) + 1;
    (next <= MAX_DAILY_SEQ).then_some(next)
}

/// `2025-01-15` + `1` → `250115-001`
pub fn format_quote_number(quote_date: NaiveDate, daily_seq: i32) -> String {
    format!("{}-{:03}", quote_date.format("%y%m%d"), daily_seq)
}

/// Split a quote number into its date and sequence
///
/// Used to reject malformed numbers before they reach the store.
pub fn parse_quote_number(quote_number: &str) -> Option<(NaiveDate, i32)> {
    let (day, seq) = quote_number.split_once('-')?;
    if day.len() != 6 || seq.len() != 3 {
        return None;
    }
    if !day.bytes().chain(seq.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(day, "%y%m%d").ok()?;
    let seq: i32 = seq.parse().ok()?;
    (seq >= 1).then_some((date, seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_quote_number() {
        assert_eq!(format_quote_number(date(2025, 1, 15), 1), "250115-001");
        assert_eq!(format_quote_number(date(2030, 12, 31), 42), "301231-042");
        assert_eq!(format_quote_number(date(2025, 1, 15), 999), "250115-999");
    }

    #[test]
    fn test_next_daily_seq() {
        assert_eq!(next_daily_seq(None), Some(1));
        assert_eq!(next_daily_seq(Some(1)), Some(2));
        assert_eq!(next_daily_seq(Some(998)), Some(999));
        assert_eq!(next_daily_seq(Some(999)), None);
    }

    #[test]
    fn test_parse_quote_number() {
        assert_eq!(parse_quote_number("250115-001"), Some((date(2025, 1, 15), 1)));
        assert_eq!(parse_quote_number("250115-1"), None);
        assert_eq!(parse_quote_number("251315-001"), None);
        assert_eq!(parse_quote_number("250115-000"), None);
        assert_eq!(parse_quote_number("25011a-001"), None);
        assert_eq!(parse_quote_number("../etc"), None);
    }
}
