use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, Month, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidPeriod(s.to_string()))
    }
}

/// Time range an aggregation is scoped to. `end` is the instant the window was
/// resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    pub period: Period,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl AggregationWindow {
    pub fn resolve(period: Period, now: OffsetDateTime) -> Self {
        Self {
            period,
            start: resolve_window_start(period, now),
            end: now,
        }
    }

    pub fn contains(&self, timestamp: OffsetDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

pub fn resolve_window_start(period: Period, now: OffsetDateTime) -> OffsetDateTime {
    match period {
        Period::Day => now - Duration::days(1),
        Period::Week => now - Duration::days(7),
        Period::Month => {
            let (year, month) = match now.month() {
                Month::January => (now.year() - 1, Month::December),
                month => (now.year(), month.previous()),
            };
            now.replace_date(clamped_date(year, month, now.day()))
        }
        Period::Year => now.replace_date(clamped_date(now.year() - 1, now.month(), now.day())),
    }
}

// Walks back to the last valid day of the month (31 → 30/29/28).
fn clamped_date(year: i32, month: Month, day: u8) -> Date {
    let mut day = day;
    loop {
        match Date::from_calendar_date(year, month, day) {
            Ok(date) => return date,
            Err(_) if day > 28 => day -= 1,
            Err(_) => return Date::MIN,
        }
    }
}
