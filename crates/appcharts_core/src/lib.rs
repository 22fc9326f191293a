//! Core logic for daily top-app chart collection.
//! Fetches territory rankings, stores them by natural key and serves
//! latest-date read queries.

pub mod batch;
pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use batch::{
    display_all_charts, format_chart_listing, update_all_charts, update_all_charts_with_pause,
    BatchSummary,
};
pub use client::app_store::{parse_feed, AppStoreClient, DEFAULT_BASE_URL};
pub use client::{ChartRequest, ChartSource, FetchError, FetchResult};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::chart_entry::{
    utc_today, ChartEntry, ChartEntryValidationError, ChartType, DATE_FORMAT,
};
pub use repo::chart_repo::{
    ChartRepository, EntryQuery, RepoError, RepoResult, SqliteChartRepository,
};
pub use service::chart_service::{AppTerritoryCount, ChartService, ServiceError, ServiceResult};
