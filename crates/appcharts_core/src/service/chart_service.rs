//! Chart update and read service.
//!
//! # Responsibility
//! - Fetch a territory chart only when today's rows are missing.
//! - Expose latest-date read queries to presentation callers.
//!
//! # Invariants
//! - A chart is Fresh once rows exist for today's UTC date; updates on a
//!   Fresh chart never touch the network.
//! - The store only receives the complete result list of one fetch.
//! - Fetch and store failures are returned unchanged, never swallowed.

use crate::client::{ChartRequest, ChartSource, FetchError};
use crate::model::chart_entry::{utc_today, ChartEntry, ChartType};
use crate::repo::chart_repo::{ChartRepository, EntryQuery, RepoError};
use log::info;
use std::cmp::Reverse;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error wrapping the failing collaborator.
#[derive(Debug)]
pub enum ServiceError {
    Fetch(FetchError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "chart fetch failed: {err}"),
            Self::Repo(err) => write!(f, "chart storage failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<FetchError> for ServiceError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// How many territories an app charts in on the latest date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTerritoryCount {
    pub app_name: String,
    pub territory_count: usize,
    pub icon_url: Option<String>,
}

/// Orchestrates fetch-if-stale and read queries over one repository.
pub struct ChartService<R: ChartRepository, S: ChartSource> {
    repo: R,
    source: S,
    limit: u32,
    explicit: String,
}

impl<R: ChartRepository, S: ChartSource> ChartService<R, S> {
    /// `limit` and `explicit` shape every upstream request.
    pub fn new(repo: R, source: S, limit: u32, explicit: impl Into<String>) -> Self {
        Self {
            repo,
            source,
            limit,
            explicit: explicit.into(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Makes sure today's chart is stored.
    ///
    /// Returns `Ok(false)` when today's rows already exist and `Ok(true)`
    /// after a live fetch was stored.
    pub fn update_chart_data(&self, country: &str, chart_type: ChartType) -> ServiceResult<bool> {
        let country_label = country.to_uppercase();
        if self.repo.has_data_for_date(country, chart_type, utc_today())? {
            info!(
                "event=chart_update module=service status=skip country={country_label} chart_type={chart_type}"
            );
            return Ok(false);
        }

        info!(
            "event=chart_update module=service status=start country={country_label} chart_type={chart_type}"
        );
        let request = ChartRequest {
            country: country.to_string(),
            chart_type,
            limit: self.limit,
            explicit: self.explicit.clone(),
        };
        let entries = self.source.fetch_top_apps(&request)?;
        let stored = self.repo.store_entries(&entries)?;
        info!(
            "event=chart_update module=service status=ok country={country_label} chart_type={chart_type} rows={stored}"
        );
        Ok(true)
    }

    /// Most recent stored entries for a territory, both charts when
    /// `chart_type` is `None`.
    pub fn get_latest_apps(
        &self,
        country: &str,
        chart_type: Option<ChartType>,
    ) -> ServiceResult<Vec<ChartEntry>> {
        Ok(self
            .repo
            .fetch_entries(&EntryQuery::latest(country, chart_type))?)
    }

    pub fn app_names_for_latest(
        &self,
        chart_type: ChartType,
        limit: u32,
    ) -> ServiceResult<Vec<String>> {
        Ok(self.repo.app_names_for_latest(chart_type, limit)?)
    }

    pub fn countries_for_app(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> ServiceResult<Vec<String>> {
        Ok(self.repo.countries_for_app(app_name, chart_type, limit)?)
    }

    pub fn app_icon(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> ServiceResult<Option<String>> {
        Ok(self.repo.app_icon(app_name, chart_type, limit)?)
    }

    /// Apps of the latest chart ranked by how many territories list them
    /// within `rank <= limit`, most widespread first, at most `top_n`.
    pub fn territory_ranking(
        &self,
        chart_type: ChartType,
        limit: u32,
        top_n: usize,
    ) -> ServiceResult<Vec<AppTerritoryCount>> {
        let mut counts = Vec::new();
        for app_name in self.repo.app_names_for_latest(chart_type, limit)? {
            let territory_count = self
                .repo
                .countries_for_app(&app_name, chart_type, limit)?
                .len();
            let icon_url = self.repo.app_icon(&app_name, chart_type, limit)?;
            counts.push(AppTerritoryCount {
                app_name,
                territory_count,
                icon_url,
            });
        }

        // Stable sort keeps the case-insensitive name order among ties.
        counts.sort_by_key(|count| Reverse(count.territory_count));
        counts.truncate(top_n);
        Ok(counts)
    }
}
