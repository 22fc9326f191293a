//! Daily chart update job.
//!
//! # Responsibility
//! - Resolve run configuration from defaults, an optional JSON file and flags.
//! - Update every territory chart that is stale today, then log the latest
//!   listings.
//!
//! Any fetch or storage failure aborts the run with a non-zero exit code.

use appcharts_core::{
    default_log_level, display_all_charts, init_logging, update_all_charts, AppConfig,
    AppStoreClient, ChartService, SqliteChartRepository,
};
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Number of apps to fetch per chart
    #[arg(long)]
    limit: Option<u32>,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated territory codes to restrict the run, e.g. us,gb
    #[arg(long, value_delimiter = ',')]
    territories: Option<Vec<String>>,

    /// Only log stored charts, never call the upstream API
    #[arg(long)]
    skip_update: bool,

    /// One of trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Also write rolling log files to this directory
    #[arg(long)]
    log_dir: Option<String>,
}

fn resolve_config(args: &Args) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(db_path) = &args.db_path {
        config.db_path = db_path.clone();
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if let Some(territories) = &args.territories {
        config.territories = territories
            .iter()
            .map(|code| code.trim().to_ascii_lowercase())
            .collect();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, args.log_dir.as_deref())?;

    let config = resolve_config(&args)?;
    info!(
        "event=run_start module=cli status=ok db_path={} limit={} territories={} chart_types={}",
        config.db_path.display(),
        config.limit,
        config.territories.len(),
        config.chart_types.len()
    );

    let repo = SqliteChartRepository::try_new(&config.db_path)?;
    let client = AppStoreClient::new(config.api_base_url.clone(), config.request_timeout())?;
    let service = ChartService::new(repo, client, config.limit, config.explicit.clone());

    if !args.skip_update {
        update_all_charts(&service, &config)?;
    }
    let displayed = display_all_charts(&service, &config)?;

    info!("event=run_finish module=cli status=ok charts_displayed={displayed}");
    Ok(())
}
