//! # Month Keys
//!
//! Account months are `YYYY-MM` strings. Balance sheets are keyed by
//! them, chain from the immediately preceding month, and aggregate
//! service-order usage over the month's UTC time window.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::error::ValidationError;

/// Validates a `YYYY-MM` month key.
pub fn validate_month(month: &str) -> Result<(), ValidationError> {
    parse(month).map(|_| ())
}

/// Returns the immediately preceding month key.
///
/// `"2026-03"` → `"2026-02"`, `"2026-01"` → `"2025-12"`.
pub fn previous_month(month: &str) -> Result<String, ValidationError> {
    let (year, mon) = parse(month)?;
    let (py, pm) = if mon == 1 { (year - 1, 12) } else { (year, mon - 1) };
    Ok(format!("{py:04}-{pm:02}"))
}

/// Returns the immediately following month key.
///
/// `"2026-02"` → `"2026-03"`, `"2025-12"` → `"2026-01"`.
pub fn next_month(month: &str) -> Result<String, ValidationError> {
    let (year, mon) = parse(month)?;
    let (ny, nm) = if mon == 12 { (year + 1, 1) } else { (year, mon + 1) };
    Ok(format!("{ny:04}-{nm:02}"))
}

/// Returns the half-open UTC window `[start, end)` covering the month.
pub fn month_bounds(month: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let (year, mon) = parse(month)?;
    let start = first_day(year, mon)?;
    let (ny, nm) = if mon == 12 { (year + 1, 1) } else { (year, mon + 1) };
    let end = first_day(ny, nm)?;
    Ok((start, end))
}

/// Returns the month key covering a timestamp.
pub fn month_of(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

fn parse(month: &str) -> Result<(i32, u32), ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: "expected YYYY-MM".to_string(),
    };

    let (y, m) = month.split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let mon: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&mon) {
        return Err(invalid());
    }
    Ok((year, mon))
}

fn first_day(year: i32, month: u32) -> Result<DateTime<Utc>, ValidationError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "month".to_string(),
            reason: "not a representable calendar month".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2026-08").is_ok());
        assert!(validate_month("2026-13").is_err());
        assert!(validate_month("2026-00").is_err());
        assert!(validate_month("202608").is_err());
        assert!(validate_month("2026-8").is_err());
        assert!(validate_month("").is_err());
    }

    #[test]
    fn test_previous_month() {
        assert_eq!(previous_month("2026-03").unwrap(), "2026-02");
        assert_eq!(previous_month("2026-01").unwrap(), "2025-12");
    }

    #[test]
    fn test_next_month() {
        assert_eq!(next_month("2026-02").unwrap(), "2026-03");
        assert_eq!(next_month("2025-12").unwrap(), "2026-01");
    }

    #[test]
    fn test_month_bounds_cover_whole_month() {
        let (start, end) = month_bounds("2026-02").unwrap();
        assert_eq!(start.to_rfc3339(), "2026-02-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-01T00:00:00+00:00");

        // December rolls into January.
        let (start, end) = month_bounds("2025-12").unwrap();
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_month_of() {
        let at = Utc.with_ymd_and_hms(2026, 8, 5, 13, 45, 0).unwrap();
        assert_eq!(month_of(at), "2026-08");
    }
}
