//! Chart entry domain model.
//!
//! # Responsibility
//! - Define the canonical ranked record produced by one chart fetch.
//! - Provide chart-type naming shared by the upstream URL and storage.
//!
//! # Invariants
//! - `(country, chart_type, rank, fetched_date)` is the natural key.
//! - `rank` is 1-based and assigned by list position at fetch time.
//! - `country` is a two-letter lowercase territory code.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Date format used by storage and log output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ranking category published by the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    /// Top free apps.
    TopFree,
    /// Top paid apps.
    TopPaid,
}

impl ChartType {
    /// All chart types in storage order.
    pub const ALL: [ChartType; 2] = [ChartType::TopFree, ChartType::TopPaid];

    /// Stable name used in upstream URLs and the `chart_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopFree => "top-free",
            Self::TopPaid => "top-paid",
        }
    }
}

impl Display for ChartType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartEntryValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "top-free" => Ok(Self::TopFree),
            "top-paid" => Ok(Self::TopPaid),
            other => Err(ChartEntryValidationError::UnknownChartType(other.to_string())),
        }
    }
}

/// One ranked app in a territory chart for a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEntry {
    /// 1-based position in the fetched list.
    pub rank: u32,
    /// Display name; empty when upstream omitted it.
    pub app_name: String,
    pub artist: String,
    pub icon_url: String,
    pub country: String,
    pub chart_type: ChartType,
    /// UTC calendar day the chart was fetched.
    pub fetched_date: NaiveDate,
}

/// Validation failures for chart entries and their key parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartEntryValidationError {
    ZeroRank,
    InvalidCountry(String),
    UnknownChartType(String),
}

impl Display for ChartEntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroRank => write!(f, "rank must be >= 1"),
            Self::InvalidCountry(value) => {
                write!(f, "country must be a two-letter code, got `{value}`")
            }
            Self::UnknownChartType(value) => {
                write!(f, "unknown chart type `{value}`; expected top-free|top-paid")
            }
        }
    }
}

impl Error for ChartEntryValidationError {}

impl ChartEntry {
    /// Checks natural-key fields before persistence.
    ///
    /// Name, artist and icon fields are not checked; upstream may leave them
    /// empty.
    pub fn validate(&self) -> Result<(), ChartEntryValidationError> {
        if self.rank == 0 {
            return Err(ChartEntryValidationError::ZeroRank);
        }
        validate_country(&self.country)
    }
}

/// Returns `Ok` for two-letter lowercase ASCII territory codes.
pub fn validate_country(country: &str) -> Result<(), ChartEntryValidationError> {
    if country.len() == 2 && country.bytes().all(|b| b.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(ChartEntryValidationError::InvalidCountry(
            country.to_string(),
        ))
    }
}

/// Current calendar date in UTC.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}
