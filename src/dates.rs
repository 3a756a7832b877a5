//! Candidate dates and the date tokens used in edition URLs and titles.
//!
//! Editions are identified by calendar date in the caller's local day. The
//! tokens below must be reproduced exactly, the publisher's file names
//! depend on them:
//!
//! - URL token: `DD_MM_YYYY`
//! - display token: `DD.MM.YYYY`
//! - directory segments: `YYYY` and `MM`

use crate::resolver::ResolveError;
use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;

/// Dates for offsets `0..=lookback_days`, newest first.
///
/// The list always starts at `today` and decreases by exactly one calendar
/// day per entry.
///
/// # Returns
///
/// `lookback_days + 1` dates; `lookback_days = 0` yields `[today]`.
///
/// # Errors
///
/// Returns [`ResolveError::DateOutOfRange`] when stepping back would leave
/// the range chrono can represent.
pub fn candidate_dates(today: NaiveDate, lookback_days: u32) -> Result<Vec<NaiveDate>, ResolveError> {
    (0..=lookback_days)
        .map(|offset| {
            today
                .checked_sub_days(Days::new(u64::from(offset)))
                .ok_or(ResolveError::DateOutOfRange { today, offset })
        })
        .collect()
}

/// Four-digit year, zero padded (`0987`, `2024`).
///
/// Used for the year directory of the edition path and the tail of both
/// date tokens.
pub fn year_token(date: NaiveDate) -> String {
    format!("{:04}", date.year())
}

/// Two-digit month, `01` to `12`.
pub fn month_token(date: NaiveDate) -> String {
    format!("{:02}", date.month())
}

/// Two-digit day of month, `01` to `31`.
pub fn day_token(date: NaiveDate) -> String {
    format!("{:02}", date.day())
}

/// `DD_MM_YYYY`, as embedded in edition file names.
pub fn path_token(date: NaiveDate) -> String {
    [day_token(date), month_token(date), year_token(date)].iter().join("_")
}

/// `DD.MM.YYYY`, as shown to readers.
pub fn display_token(date: NaiveDate) -> String {
    [day_token(date), month_token(date), year_token(date)].iter().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tokens() {
        let date = ymd(2024, 3, 5);
        assert_eq!(path_token(date), "05_03_2024");
        assert_eq!(display_token(date), "05.03.2024");
        assert_eq!(format!("{}/{}", year_token(date), month_token(date)), "2024/03");
    }

    #[test]
    fn test_year_token_is_four_digits() {
        assert_eq!(year_token(ymd(987, 1, 1)), "0987");
    }

    #[test]
    fn test_candidate_dates_count_and_order() {
        let today = ymd(2024, 3, 5);
        let dates = candidate_dates(today, 7).unwrap();

        assert_eq!(dates.len(), 8);
        assert_eq!(dates[0], today);
        for pair in dates.windows(2) {
            assert_eq!(pair[0].pred_opt().unwrap(), pair[1]);
        }
        assert_eq!(*dates.last().unwrap(), ymd(2024, 2, 27));
    }

    #[test]
    fn test_candidate_dates_cross_leap_day_and_year() {
        let dates = candidate_dates(ymd(2024, 3, 1), 1).unwrap();
        assert_eq!(dates, vec![ymd(2024, 3, 1), ymd(2024, 2, 29)]);

        let dates = candidate_dates(ymd(2025, 1, 2), 2).unwrap();
        assert_eq!(dates, vec![ymd(2025, 1, 2), ymd(2025, 1, 1), ymd(2024, 12, 31)]);
    }

    #[test]
    fn test_zero_lookback_is_today_only() {
        let today = ymd(2024, 3, 5);
        assert_eq!(candidate_dates(today, 0).unwrap(), vec![today]);
    }

    #[test]
    fn test_candidate_dates_out_of_range() {
        let err = candidate_dates(NaiveDate::MIN, 1).unwrap_err();
        assert!(matches!(err, ResolveError::DateOutOfRange { offset: 1, .. }));
    }
}
