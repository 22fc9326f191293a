//! Apple Marketing Tools RSS client.
//!
//! # Responsibility
//! - Build feed URLs for a territory and chart type.
//! - Turn `feed.results[]` into ranked `ChartEntry` values.
//!
//! # Invariants
//! - Ranks are exactly `1..=N` in response order.
//! - Missing or `null` `name`/`artistName`/`artworkUrl100` fields become
//!   empty strings.
//! - Non-success responses fail; nothing is retried here.

use super::{ChartRequest, ChartSource, FetchError, FetchResult};
use crate::model::chart_entry::{utc_today, ChartEntry, ChartType};
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Public base URL of the RSS v2 API.
pub const DEFAULT_BASE_URL: &str = "https://rss.applemarketingtools.com/api/v2";

#[derive(Debug, Default, Deserialize)]
struct FeedEnvelope {
    #[serde(default)]
    feed: Feed,
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    results: Vec<FeedResult>,
}

/// Absent and `null` fields both decode to `None`.
#[derive(Debug, Default, Deserialize)]
struct FeedResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "artistName")]
    artist_name: Option<String>,
    #[serde(default, rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

/// Blocking HTTP client for the top-apps feed.
#[derive(Debug, Clone)]
pub struct AppStoreClient {
    http: Client,
    base_url: String,
}

impl AppStoreClient {
    /// Builds a client against `base_url`; `timeout = None` keeps the
    /// `reqwest` default.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> FetchResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FetchError::Http)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Feed URL: `{base}/{country}/apps/{chart_type}/{limit}/{explicit}.json`.
    pub fn feed_url(&self, request: &ChartRequest) -> String {
        format!(
            "{}/{}/apps/{}/{}/{}.json",
            self.base_url, request.country, request.chart_type, request.limit, request.explicit
        )
    }
}

impl ChartSource for AppStoreClient {
    fn fetch_top_apps(&self, request: &ChartRequest) -> FetchResult<Vec<ChartEntry>> {
        let url = self.feed_url(request);
        debug!("event=chart_fetch module=client status=start url={url}");

        let response = self.http.get(&url).send().map_err(FetchError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(FetchError::Http)?;
        let entries = parse_feed(&body, &request.country, request.chart_type, utc_today())?;
        info!(
            "event=chart_fetch module=client status=ok country={} chart_type={} results={}",
            request.country,
            request.chart_type,
            entries.len()
        );
        Ok(entries)
    }
}

/// Parses a feed body into ranked entries stamped with `fetched_date`.
pub fn parse_feed(
    body: &str,
    country: &str,
    chart_type: ChartType,
    fetched_date: NaiveDate,
) -> FetchResult<Vec<ChartEntry>> {
    let envelope: FeedEnvelope = serde_json::from_str(body).map_err(FetchError::Decode)?;
    let entries = envelope
        .feed
        .results
        .into_iter()
        .zip(1u32..)
        .map(|(result, rank)| ChartEntry {
            rank,
            app_name: result.name.unwrap_or_default(),
            artist: result.artist_name.unwrap_or_default(),
            icon_url: result.artwork_url_100.unwrap_or_default(),
            country: country.to_string(),
            chart_type,
            fetched_date,
        })
        .collect();
    Ok(entries)
}
