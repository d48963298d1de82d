use chrono::{DateTime, Utc};
use std::fmt;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const MONTH: f64 = 30.0 * DAY;
const YEAR: f64 = 365.0 * DAY;

/// Age of a comment, bucketed for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    Moments,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Months(i64),
    Years(i64),
}

impl RelativeTime {
    pub fn between(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = (now - created).num_milliseconds() as f64 / 1000.0;
        let rounded = |unit: f64| (seconds / unit).round() as i64;

        if seconds < MINUTE {
            RelativeTime::Moments
        } else if seconds < HOUR {
            RelativeTime::Minutes(rounded(MINUTE))
        } else if seconds < DAY {
            RelativeTime::Hours(rounded(HOUR))
        } else if seconds < MONTH {
            RelativeTime::Days(rounded(DAY))
        } else if seconds < YEAR {
            RelativeTime::Months(rounded(MONTH))
        } else {
            RelativeTime::Years(rounded(YEAR))
        }
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (count, one, many) = match *self {
            RelativeTime::Moments => return f.write_str("vor wenigen Augenblicken"),
            RelativeTime::Minutes(n) => (n, "Minute", "Minuten"),
            RelativeTime::Hours(n) => (n, "Stunde", "Stunden"),
            RelativeTime::Days(n) => (n, "Tag", "Tagen"),
            RelativeTime::Months(n) => (n, "Monat", "Monaten"),
            RelativeTime::Years(n) => (n, "Jahr", "Jahren"),
        };
        if count == 1 {
            write!(f, "vor 1 {}", one)
        } else {
            write!(f, "vor {} {}", count, many)
        }
    }
}

pub fn format_relative(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    RelativeTime::between(created, now).to_string()
}
