//! Chart repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist fetched chart entries into `top_apps` with upsert semantics.
//! - Answer freshness checks and latest-date read queries.
//!
//! # Invariants
//! - Write paths call `ChartEntry::validate()` before SQL mutations.
//! - Read paths reject invalid persisted keys instead of masking them; NULL
//!   name, artist or icon columns read back as empty strings.
//! - Every operation opens its own connection and closes it on return.

use crate::db::{open_db, DbError};
use crate::model::chart_entry::{ChartEntry, ChartEntryValidationError, ChartType, DATE_FORMAT};
use chrono::NaiveDate;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const ENTRY_SELECT_SQL: &str = "SELECT
    rank,
    app_name,
    artist,
    icon_url,
    country,
    chart_type,
    fetched_date
FROM top_apps";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for chart persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ChartEntryValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted chart data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ChartEntryValidationError> for RepoError {
    fn from(value: ChartEntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for reading stored entries of one territory.
#[derive(Debug, Clone)]
pub struct EntryQuery {
    pub country: String,
    /// `None` returns both chart types.
    pub chart_type: Option<ChartType>,
    /// `None` resolves to the most recent stored date for the filter.
    pub date: Option<NaiveDate>,
}

impl EntryQuery {
    /// Latest entries for a territory, optionally narrowed to one chart.
    pub fn latest(country: impl Into<String>, chart_type: Option<ChartType>) -> Self {
        Self {
            country: country.into(),
            chart_type,
            date: None,
        }
    }
}

/// Repository interface for chart storage.
pub trait ChartRepository {
    /// Upserts entries by natural key; returns the number of rows written.
    fn store_entries(&self, entries: &[ChartEntry]) -> RepoResult<usize>;
    fn has_data_for_date(
        &self,
        country: &str,
        chart_type: ChartType,
        date: NaiveDate,
    ) -> RepoResult<bool>;
    /// Ordered by chart type, then rank.
    fn fetch_entries(&self, query: &EntryQuery) -> RepoResult<Vec<ChartEntry>>;
    /// Distinct app names within `rank <= limit` on the latest date of a chart.
    fn app_names_for_latest(&self, chart_type: ChartType, limit: u32) -> RepoResult<Vec<String>>;
    /// Territories where an app charts within `rank <= limit` on the latest date.
    fn countries_for_app(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> RepoResult<Vec<String>>;
    fn app_icon(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> RepoResult<Option<String>>;
}

/// SQLite-backed chart repository holding only the database path.
#[derive(Debug, Clone)]
pub struct SqliteChartRepository {
    db_path: PathBuf,
}

impl SqliteChartRepository {
    /// Creates a repository and ensures the schema exists.
    pub fn try_new(db_path: impl AsRef<Path>) -> RepoResult<Self> {
        let repo = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        repo.connect()?;
        Ok(repo)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> RepoResult<Connection> {
        Ok(open_db(&self.db_path)?)
    }
}

impl ChartRepository for SqliteChartRepository {
    fn store_entries(&self, entries: &[ChartEntry]) -> RepoResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        for entry in entries {
            entry.validate()?;
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO top_apps (
                    country,
                    chart_type,
                    rank,
                    app_name,
                    artist,
                    icon_url,
                    fetched_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (country, chart_type, rank, fetched_date) DO UPDATE SET
                    app_name = excluded.app_name,
                    artist = excluded.artist,
                    icon_url = excluded.icon_url;",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.country.as_str(),
                    entry.chart_type.as_str(),
                    entry.rank,
                    entry.app_name.as_str(),
                    entry.artist.as_str(),
                    entry.icon_url.as_str(),
                    entry.fetched_date,
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "event=entries_store module=repo status=ok rows={}",
            entries.len()
        );
        Ok(entries.len())
    }

    fn has_data_for_date(
        &self,
        country: &str,
        chart_type: ChartType,
        date: NaiveDate,
    ) -> RepoResult<bool> {
        let conn = self.connect()?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM top_apps
                WHERE country = ?1 AND chart_type = ?2 AND fetched_date = ?3
            );",
            params![country, chart_type.as_str(), date],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn fetch_entries(&self, query: &EntryQuery) -> RepoResult<Vec<ChartEntry>> {
        let conn = self.connect()?;

        let date = match query.date {
            Some(date) => date,
            None => match latest_date(&conn, &query.country, query.chart_type)? {
                Some(date) => date,
                None => return Ok(Vec::new()),
            },
        };

        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE country = ? AND fetched_date = ?");
        let mut bind_values: Vec<Value> = vec![
            Value::Text(query.country.clone()),
            Value::Text(date.to_string()),
        ];
        if let Some(chart_type) = query.chart_type {
            sql.push_str(" AND chart_type = ?");
            bind_values.push(Value::Text(chart_type.as_str().to_string()));
        }
        sql.push_str(" ORDER BY chart_type ASC, rank ASC");

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn app_names_for_latest(&self, chart_type: ChartType, limit: u32) -> RepoResult<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "WITH latest AS (
                SELECT MAX(fetched_date) AS max_date
                FROM top_apps
                WHERE chart_type = ?1
            )
            SELECT DISTINCT COALESCE(app_name, '') AS app_name
            FROM top_apps
            JOIN latest ON top_apps.fetched_date = latest.max_date
            WHERE chart_type = ?1
              AND rank <= ?2
            ORDER BY app_name COLLATE NOCASE;",
        )?;
        let names = stmt
            .query_map(params![chart_type.as_str(), limit], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn countries_for_app(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> RepoResult<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "WITH latest AS (
                SELECT MAX(fetched_date) AS max_date
                FROM top_apps
                WHERE chart_type = ?1
            )
            SELECT DISTINCT country
            FROM top_apps
            JOIN latest ON top_apps.fetched_date = latest.max_date
            WHERE chart_type = ?1
              AND rank <= ?2
              AND COALESCE(app_name, '') = ?3
            ORDER BY country;",
        )?;
        let countries = stmt
            .query_map(params![chart_type.as_str(), limit, app_name], |row| {
                row.get(0)
            })?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(countries)
    }

    fn app_icon(
        &self,
        app_name: &str,
        chart_type: ChartType,
        limit: u32,
    ) -> RepoResult<Option<String>> {
        let conn = self.connect()?;
        let icon = conn
            .query_row(
                "WITH latest AS (
                    SELECT MAX(fetched_date) AS max_date
                    FROM top_apps
                    WHERE chart_type = ?1
                )
                SELECT COALESCE(icon_url, '')
                FROM top_apps
                JOIN latest ON top_apps.fetched_date = latest.max_date
                WHERE chart_type = ?1
                  AND rank <= ?2
                  AND COALESCE(app_name, '') = ?3
                ORDER BY rank, country
                LIMIT 1;",
                params![chart_type.as_str(), limit, app_name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(icon)
    }
}

fn latest_date(
    conn: &Connection,
    country: &str,
    chart_type: Option<ChartType>,
) -> RepoResult<Option<NaiveDate>> {
    let date = match chart_type {
        Some(chart_type) => conn.query_row(
            "SELECT MAX(fetched_date) FROM top_apps WHERE country = ?1 AND chart_type = ?2;",
            params![country, chart_type.as_str()],
            |row| row.get::<_, Option<NaiveDate>>(0),
        )?,
        None => conn.query_row(
            "SELECT MAX(fetched_date) FROM top_apps WHERE country = ?1;",
            [country],
            |row| row.get::<_, Option<NaiveDate>>(0),
        )?,
    };
    Ok(date)
}

/// Tables written before versioning allow NULL in the text columns.
fn optional_text(row: &Row<'_>, column: &str) -> RepoResult<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<ChartEntry> {
    let rank_value: i64 = row.get("rank")?;
    let rank = u32::try_from(rank_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid rank `{rank_value}` in top_apps.rank"))
    })?;

    let type_text: String = row.get("chart_type")?;
    let chart_type = type_text.parse::<ChartType>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid chart type `{type_text}` in top_apps.chart_type"
        ))
    })?;

    let date_text: String = row.get("fetched_date")?;
    let fetched_date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in top_apps.fetched_date"))
    })?;

    let entry = ChartEntry {
        rank,
        app_name: optional_text(row, "app_name")?,
        artist: optional_text(row, "artist")?,
        icon_url: optional_text(row, "icon_url")?,
        country: row.get("country")?,
        chart_type,
        fetched_date,
    };
    entry
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(entry)
}
