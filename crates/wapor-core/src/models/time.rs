use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WaporError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(WaporError::InvalidTimeRange {
                input: format!("{},{}", start, end),
                reason: "start must be before end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Range filter understood by the query endpoint, e.g. `[2009-01-01,2009-02-01)`
    pub fn to_filter(&self) -> String {
        format!("[{})", self)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

impl FromStr for TimeRange {
    type Err = WaporError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| WaporError::InvalidTimeRange {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = s.split_once(',').ok_or_else(|| invalid("expected START,END"))?;
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)
            .map_err(|_| invalid("start is not a YYYY-MM-DD date"))?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)
            .map_err(|_| invalid("end is not a YYYY-MM-DD date"))?;

        Self::new(start, end).map_err(|_| invalid("start must be before end"))
    }
}

/// Parse a WaPOR time member code such as `[2009-01-01,2009-01-11)`.
pub fn parse_time_code(code: &str) -> Option<(NaiveDate, NaiveDate)> {
    let inner = code.trim().strip_prefix('[')?.strip_suffix(')')?;
    let (start, end) = inner.split_once(',')?;
    let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).ok()?;
    let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).ok()?;
    Some((start, end))
}
