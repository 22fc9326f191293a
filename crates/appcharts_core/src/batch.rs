//! Batch driver over all configured territories and chart types.
//!
//! # Responsibility
//! - Update every territory x chart type pair in configured order.
//! - Pause after each live fetch to stay under the upstream rate limit.
//! - Log the latest stored listings for operators.
//!
//! # Invariants
//! - The first failing pair aborts the batch; later pairs are not attempted.
//! - Skipped (already fresh) pairs never pause.

use crate::client::ChartSource;
use crate::config::AppConfig;
use crate::model::chart_entry::{ChartEntry, ChartType};
use crate::repo::chart_repo::ChartRepository;
use crate::service::chart_service::{ChartService, ServiceResult};
use log::info;
use std::time::Duration;

const NAME_WIDTH: usize = 25;
const ARTIST_WIDTH: usize = 20;
const RULE_WIDTH: usize = 60;

/// Outcome counts of one update batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub skipped: usize,
}

/// Updates every configured pair, sleeping `config.fetch_delay()` after
/// each live fetch.
pub fn update_all_charts<R, S>(
    service: &ChartService<R, S>,
    config: &AppConfig,
) -> ServiceResult<BatchSummary>
where
    R: ChartRepository,
    S: ChartSource,
{
    update_all_charts_with_pause(
        service,
        &config.territories,
        &config.chart_types,
        config.fetch_delay(),
        std::thread::sleep,
    )
}

/// Same as [`update_all_charts`] with an injectable pause.
pub fn update_all_charts_with_pause<R, S, P>(
    service: &ChartService<R, S>,
    territories: &[String],
    chart_types: &[ChartType],
    delay: Duration,
    mut pause: P,
) -> ServiceResult<BatchSummary>
where
    R: ChartRepository,
    S: ChartSource,
    P: FnMut(Duration),
{
    let mut summary = BatchSummary::default();
    for territory in territories {
        for &chart_type in chart_types {
            if service.update_chart_data(territory, chart_type)? {
                summary.fetched += 1;
                if !delay.is_zero() {
                    pause(delay);
                }
            } else {
                summary.skipped += 1;
            }
        }
    }

    info!(
        "event=batch_update module=batch status=ok fetched={} skipped={}",
        summary.fetched, summary.skipped
    );
    Ok(summary)
}

/// Logs the latest stored chart of every configured pair.
///
/// Returns how many charts had stored rows.
pub fn display_all_charts<R, S>(
    service: &ChartService<R, S>,
    config: &AppConfig,
) -> ServiceResult<usize>
where
    R: ChartRepository,
    S: ChartSource,
{
    let mut displayed = 0;
    for territory in &config.territories {
        let label = territory.to_uppercase();
        info!("=== {label} Data ===");
        for &chart_type in &config.chart_types {
            let entries = service.get_latest_apps(territory, Some(chart_type))?;
            let Some(top) = entries.first() else {
                info!("No {chart_type} apps found for {label}.");
                continue;
            };

            info!("Chart: {chart_type}");
            info!("Data Fetched On: {}", top.fetched_date);
            info!("Top-1 App Icon: {}", top.icon_url);
            for line in format_chart_listing(&entries) {
                info!("{line}");
            }
            displayed += 1;
        }
    }
    Ok(displayed)
}

/// Renders a fixed-width `Rank | App Name | Artist` table.
pub fn format_chart_listing(entries: &[ChartEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 2);
    lines.push(format!(
        "{:<4} | {:<width$} | {}",
        "Rank",
        "App Name",
        "Artist",
        width = NAME_WIDTH
    ));
    lines.push("-".repeat(RULE_WIDTH));
    for entry in entries {
        lines.push(format!(
            "{:<4} | {:<width$} | {}",
            entry.rank,
            truncate_chars(&entry.app_name, NAME_WIDTH),
            truncate_chars(&entry.artist, ARTIST_WIDTH),
            width = NAME_WIDTH
        ));
    }
    lines
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
