//! Decides which tax year a reward belongs to. All date math happens in UTC so a report comes out
//! the same regardless of the timezone of the machine generating it.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Display format of the date column, e.g. `14-11-2023 22:13:20`.
pub const REPORT_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTaxYearError {
    #[error("tax year must be four digits, got {0:?}")]
    NotFourDigits(String),
}

impl FromStr for TaxYear {
    type Err = ParseTaxYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseTaxYearError::NotFourDigits(s.to_string()));
        }

        s.parse::<i32>()
            .map(TaxYear)
            .map_err(|_| ParseTaxYearError::NotFourDigits(s.to_string()))
    }
}

impl Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl TaxYear {
    /// The most recent year that has fully ended, the one people usually file for.
    pub fn previous(now: DateTime<Utc>) -> Self {
        TaxYear(now.year() - 1)
    }

    pub fn contains(&self, date_time: &DateTime<Utc>) -> bool {
        date_time.year() == self.0
    }
}

/// The API has been seen sending `blockTime` both as a string and as a number.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockTime {
    Seconds(i64),
    Text(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockTimeError {
    #[error("missing blockTime")]
    Missing,
    #[error("blockTime {0:?} is not a base-10 integer")]
    NotAnInteger(String),
    #[error("blockTime {0} is outside the representable date range")]
    OutOfRange(i64),
}

impl BlockTime {
    pub fn to_date_time(&self) -> Result<DateTime<Utc>, BlockTimeError> {
        let seconds = match self {
            BlockTime::Seconds(seconds) => *seconds,
            BlockTime::Text(text) => text
                .parse::<i64>()
                .map_err(|_| BlockTimeError::NotAnInteger(text.clone()))?,
        };

        Utc.timestamp_opt(seconds, 0)
            .single()
            .ok_or(BlockTimeError::OutOfRange(seconds))
    }
}

pub fn format_report_date(date_time: &DateTime<Utc>) -> String {
    date_time.format(REPORT_DATE_FORMAT).to_string()
}

/// Returns the formatted report date when the event happened within `year`, `None` when it
/// happened in another year. A timestamp that can't be interpreted is an error, never a skip.
pub fn event_date(
    block_time: Option<&BlockTime>,
    year: TaxYear,
) -> Result<Option<String>, BlockTimeError> {
    let date_time = block_time.ok_or(BlockTimeError::Missing)?.to_date_time()?;

    if year.contains(&date_time) {
        Ok(Some(format_report_date(&date_time)))
    } else {
        Ok(None)
    }
}
