//! Run configuration for chart updates.
//!
//! # Responsibility
//! - Hold every tunable of a run in one explicit struct passed to components.
//! - Load optional JSON overrides on top of built-in defaults.
//!
//! # Invariants
//! - A validated config has `limit >= 1`, at least one territory and one
//!   chart type, and only two-letter lowercase territory codes.

use crate::client::app_store::DEFAULT_BASE_URL;
use crate::model::chart_entry::{validate_country, ChartType};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "hackathon.db";
pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_EXPLICIT: &str = "apps";
pub const DEFAULT_FETCH_DELAY_SECS: u64 = 10;

/// Territories with an App Store top-apps feed.
pub const DEFAULT_TERRITORIES: &[&str] = &[
    "ae", "ag", "ai", "al", "am", "ao", "ar", "at", "au", "az", "bb", "be", "bf", "bg", "bh", "bj",
    "bm", "bn", "bo", "br", "bs", "bt", "bw", "by", "bz", "ca", "cg", "ch", "cl", "cn", "co", "cr",
    "cv", "cy", "cz", "de", "dk", "dm", "do", "dz", "ec", "ee", "eg", "es", "fi", "fj", "fm", "fr",
    "ga", "gb", "gd", "gh", "gm", "gr", "gt", "gw", "gy", "hk", "hn", "hr", "hu", "id", "ie", "il",
    "in", "iq", "is", "it", "jm", "jo", "jp", "ke", "kg", "kh", "kn", "kr", "kw", "ky", "kz", "la",
    "lb", "lc", "lk", "lr", "lt", "lu", "lv", "md", "mg", "mk", "ml", "mo", "mr", "ms", "mt", "mu",
    "mw", "mx", "my", "mz", "na", "ne", "ng", "ni", "nl", "no", "np", "nz", "om", "pa", "pe", "pg",
    "ph", "pk", "pl", "pt", "pw", "py", "qa", "ro", "ru", "sa", "sb", "sc", "se", "sg", "si", "sk",
    "sl", "sn", "sr", "st", "sv", "sz", "tc", "td", "th", "tj", "tm", "tn", "tr", "tt", "tw", "tz",
    "ua", "ug", "us", "uy", "uz", "vc", "ve", "vg", "vn", "ye", "za", "zm", "zw",
];

/// Configuration loading and validation failures.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings shared by the client, repository, service and batch driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub api_base_url: String,
    pub chart_types: Vec<ChartType>,
    pub territories: Vec<String>,
    pub limit: u32,
    pub explicit: String,
    /// Pause after each live fetch.
    pub fetch_delay_secs: u64,
    /// `None` keeps the HTTP client default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            chart_types: ChartType::ALL.to_vec(),
            territories: DEFAULT_TERRITORIES
                .iter()
                .map(|code| code.to_string())
                .collect(),
            limit: DEFAULT_LIMIT,
            explicit: DEFAULT_EXPLICIT.to_string(),
            fetch_delay_secs: DEFAULT_FETCH_DELAY_SECS,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_secs(self.fetch_delay_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::Invalid("limit must be >= 1".to_string()));
        }
        if self.chart_types.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one chart type is required".to_string(),
            ));
        }
        if self.territories.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one territory is required".to_string(),
            ));
        }
        for territory in &self.territories {
            validate_country(territory).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        if self.explicit.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "explicit segment cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.limit, 50);
        assert_eq!(config.territories.len(), DEFAULT_TERRITORIES.len());
        assert!(config.territories.iter().any(|code| code == "us"));
        assert_eq!(config.fetch_delay(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appcharts.json");
        std::fs::write(
            &path,
            r#"{"territories":["us","gb"],"chart_types":["top-paid"],"limit":10}"#,
        )
        .unwrap();

        let config = AppConfig::from_json_file(&path).unwrap();
        assert_eq!(config.territories, vec!["us", "gb"]);
        assert_eq!(config.chart_types, vec![ChartType::TopPaid]);
        assert_eq!(config.limit, 10);
        assert_eq!(config.explicit, DEFAULT_EXPLICIT);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = AppConfig {
            limit: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            territories: vec!["usa".to_string()],
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("two-letter"));

        let config = AppConfig {
            territories: Vec::new(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::from_json_file("/nonexistent/appcharts.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/appcharts.json"));
    }
}
