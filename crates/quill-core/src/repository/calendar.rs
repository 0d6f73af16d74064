//! Month window arithmetic.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DomainError;
use crate::ports::TimeWindow;

/// Window from the first instant of `month` to the first instant of the
/// following month, both inclusive, in UTC.
///
/// A post stamped exactly at the upper bound falls into two consecutive
/// months. Archive pages rely on this, so it is kept.
pub fn month_window(year: i32, month: u32) -> Result<TimeWindow, DomainError> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::Validation(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }

    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1), 1)
    } else {
        (Some(year), month + 1)
    };

    let start = first_instant(year, month);
    let end = next_year.and_then(|y| first_instant(y, next_month));

    match (start, end) {
        (Some(start), Some(end)) => Ok(TimeWindow {
            start: start.and_utc().timestamp(),
            end: end.and_utc().timestamp(),
        }),
        _ => Err(DomainError::Validation(format!(
            "year {year} is out of range"
        ))),
    }
}

fn first_instant(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leap_february() {
        let window = month_window(2024, 2).unwrap();
        // 2024-02-01T00:00:00Z .. 2024-03-01T00:00:00Z
        assert_eq!(window.start, 1_706_745_600);
        assert_eq!(window.end, 1_709_251_200);
        assert_eq!(window.end - window.start, 29 * 86_400);
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let window = month_window(2023, 12).unwrap();
        // 2023-12-01T00:00:00Z .. 2024-01-01T00:00:00Z
        assert_eq!(window.start, 1_701_388_800);
        assert_eq!(window.end, 1_704_067_200);
    }

    #[test]
    fn test_rejects_bad_month() {
        assert!(matches!(
            month_window(2024, 0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            month_window(2024, 13),
            Err(DomainError::Validation(_))
        ));
    }
}
