//! File logging. The terminal belongs to the prompt, so log lines go to
//! `~/.swipestyle/logs/latest.log`, truncated on every start.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SWIPESTYLE_LOG";

pub fn log_dir() -> PathBuf {
    crate::config::Config::data_dir().join("logs")
}

pub fn init_global_logger(debug: bool) -> Result<PathBuf> {
    init_logger_in(&log_dir(), debug)
}

pub fn init_logger_in(dir: &Path, debug: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("latest.log");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let default_level = if debug { "swipestyle_cli=debug" } else { "swipestyle_cli=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger already initialized: {}", e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_to_latest_log() {
        let dir = TempDir::new().unwrap();
        let path = init_logger_in(dir.path(), true).unwrap();
        tracing::info!("logger smoke test");
        assert_eq!(path, dir.path().join("latest.log"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("logger smoke test"));
    }
}
