//! The edition date a run is requested for.
//!
//! The portal addresses editions by a `dd-mm-yyyy` path segment and only
//! keeps a rolling window of past editions online, so the date type carries
//! both the formatting and the window check.

use crate::error::EpaperError;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path-segment format used by the portal and by every file name we write.
const PORTAL_FORMAT: &str = "%d-%m-%Y";

/// A calendar date selecting one day's edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EPaperDate(NaiveDate);

impl EPaperDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, month, day. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parse a `dd-mm-yyyy` string (the portal's own format).
    ///
    /// ISO `yyyy-mm-dd` is accepted too since that is what most date pickers
    /// and shells produce.
    pub fn parse(input: &str) -> Result<Self, EpaperError> {
        let trimmed = input.trim();
        NaiveDate::parse_from_str(trimmed, PORTAL_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .map(Self)
            .map_err(|_| EpaperError::InvalidDate {
                input: input.to_string(),
            })
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// `dd-mm-yyyy`, zero-padded.
    pub fn portal_segment(&self) -> String {
        format!(
            "{:02}-{:02}-{:04}",
            self.0.day(),
            self.0.month(),
            self.0.year()
        )
    }

    /// Root URL of the edition: `{base}/{edition}/{dd-mm-yyyy}/1`.
    pub fn root_url(&self, portal_base: &str, edition: &str) -> String {
        format!(
            "{}/{}/{}/1",
            portal_base.trim_end_matches('/'),
            edition.trim_matches('/'),
            self.portal_segment()
        )
    }

    /// Check that the date lies within `window_days` before `today`, inclusive
    /// of both ends. Future dates are rejected.
    pub fn ensure_within(&self, today: EPaperDate, window_days: u32) -> Result<(), EpaperError> {
        let age = today.0.signed_duration_since(self.0).num_days();
        if age < 0 || age > i64::from(window_days) {
            return Err(EpaperError::DateOutOfRange {
                date: self.portal_segment(),
                window_days,
            });
        }
        Ok(())
    }
}

impl fmt::Display for EPaperDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.portal_segment())
    }
}

impl FromStr for EPaperDate {
    type Err = EpaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for EPaperDate {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}
