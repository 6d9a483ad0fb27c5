//! Date and time utilities
//!
//! Scoring, badging and filtering never read the system clock themselves; they take a `now`
//! obtained from a [`Clock`] once per refresh.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use parking_lot::RwLock;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Parse a catalog release date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and bare years (mapped to January 1st).
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    // "2024-03-01 10:00:00" and similar: take the date part
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }

    None
}

/// Whole days from `date` to `now`; negative for dates in the future
pub fn days_since(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - date).num_days()
}

/// Calendar year of `now`
pub fn current_year(now: DateTime<Utc>) -> i32 {
    now.year()
}

/// Relative description of an instant, e.g. "5 minutes ago"
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    chrono_humanize::HumanTime::from(then - now).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_release_date() {
        assert_eq!(
            parse_release_date("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_release_date("2024-03-01T18:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_release_date("2024-03-01 10:00:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_release_date("2021"), NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("soon"), None);
    }

    #[test]
    fn test_days_since() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(days_since(date, now), 5);

        let future = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        assert_eq!(days_since(future, now), -5);
    }

    #[test]
    fn test_manual_clock() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(9));
        assert_eq!(clock.now() - start, Duration::minutes(9));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_humanize_since() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let text = humanize_since(now - Duration::minutes(5), now);
        assert!(text.contains("ago"));
    }
}
