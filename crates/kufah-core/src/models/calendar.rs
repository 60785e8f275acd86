use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days of padding around a month when fetching no-school days
const WINDOW_PADDING_DAYS: i64 = 7;

/// Default reason recorded when a day is marked no-school
pub const DEFAULT_NO_SCHOOL_REASON: &str = "No school";

/// A calendar day with no classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NoSchoolDay {
    pub date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NoSchoolDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            reason: Some(DEFAULT_NO_SCHOOL_REASON.to_string()),
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.date
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }
}

/// Fetch window for the month containing `anchor`: one week before the
/// first day through one week after the last.
pub fn no_school_window(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = anchor.with_day(1).unwrap_or(anchor);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_month.map(|d| d - Duration::days(1)).unwrap_or(first);
    (
        first - Duration::days(WINDOW_PADDING_DAYS),
        last + Duration::days(WINDOW_PADDING_DAYS),
    )
}
