//! Upstream chart sources.
//!
//! # Responsibility
//! - Define the fetch contract the chart service depends on.
//! - Host the HTTP implementation for the public ranking feed.

use crate::model::chart_entry::{ChartEntry, ChartType};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod app_store;

pub type FetchResult<T> = Result<T, FetchError>;

/// Transport, status and decoding failures from an upstream fetch.
#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status { url: String, status: u16 },
    Decode(serde_json::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "request failed: {err}"),
            Self::Status { url, status } => write!(f, "GET {url} returned HTTP {status}"),
            Self::Decode(err) => write!(f, "invalid feed body: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Status { .. } => None,
            Self::Decode(err) => Some(err),
        }
    }
}

/// Parameters of one chart fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub country: String,
    pub chart_type: ChartType,
    /// Maximum number of results requested from upstream.
    pub limit: u32,
    /// Explicit-content path segment, `apps` upstream by default.
    pub explicit: String,
}

/// Source of ranked chart entries for one territory and chart type.
pub trait ChartSource {
    fn fetch_top_apps(&self, request: &ChartRequest) -> FetchResult<Vec<ChartEntry>>;
}
