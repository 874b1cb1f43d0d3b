use anyhow::Context;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// One year of look-ahead, expressed in months so it clamps like every other step.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date {s:?} (expected YYYY-MM-DD)"))
}

/// Adds `months` calendar months, clamping the day to the target month's last day
/// (Jan 31 + 1 month = Feb 28/29).
///
/// Returns `None` only when the result leaves chrono's representable range.
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn add_years_clamped(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    add_months_clamped(date, years.checked_mul(12)?)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = add_months_clamped(first, 1)?;
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

pub fn projection_horizon(now: NaiveDate, months: u32) -> NaiveDate {
    add_months_clamped(now, months).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (y, m) = s
            .split_once('-')
            .with_context(|| format!("invalid month {s:?} (expected YYYY-MM)"))?;
        anyhow::ensure!(
            y.len() == 4 && m.len() == 2,
            "invalid month {s:?} (expected YYYY-MM)"
        );
        let year: i32 = y
            .parse()
            .with_context(|| format!("invalid year in month {s:?}"))?;
        let month: u32 = m
            .parse()
            .with_context(|| format!("invalid month number in {s:?}"))?;
        YearMonth::new(year, month).with_context(|| format!("month out of range: {s:?}"))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Months offered by a month picker: the same month last year through the same month next year.
pub fn selectable_months(today: NaiveDate) -> Vec<YearMonth> {
    let current = YearMonth::of(today);
    let mut month = YearMonth {
        year: current.year - 1,
        month: current.month,
    };
    let last = YearMonth {
        year: current.year + 1,
        month: current.month,
    };

    let mut out = Vec::with_capacity(25);
    while month <= last {
        out.push(month);
        month = month.succ();
    }
    out
}
