//! File logging.
//!
//! The terminal is owned by the UI, so log records go to
//! `<cache_dir>/drizzle/drizzle.log` and only when a filter is configured.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use color_eyre::eyre::{WrapErr, eyre};
use directories::ProjectDirs;

/// Environment variable holding the log filter, e.g. `DRIZZLE_LOG=debug`.
const LOG_ENV: &str = "DRIZZLE_LOG";

fn log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "drizzle").map(|dirs| dirs.cache_dir().join("drizzle.log"))
}

/// Install the logger. `DRIZZLE_LOG` takes precedence over `config_filter`;
/// with neither set, logging stays off.
pub fn init(config_filter: Option<&str>) -> color_eyre::Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(filter) if !filter.is_empty() => filter,
        _ => match config_filter {
            Some(filter) => filter.to_string(),
            None => return Ok(()),
        },
    };

    let path = log_path().ok_or_else(|| eyre!("could not determine the cache directory"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open {}", path.display()))?;

    env_logger::Builder::new()
        .parse_filters(&filter)
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    log::info!("logging to {} with filter {filter}", path.display());
    Ok(())
}
