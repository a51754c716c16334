use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::store::StoreError;

pub const LOG_ENV: &str = "GLANCE_LOG";

/// Filter directive to use: explicit level, then `GLANCE_LOG`, then `info`.
pub fn filter_directive(level: Option<&str>) -> String {
    let from_env = std::env::var(LOG_ENV).ok();
    let directive = [level, from_env.as_deref()]
        .into_iter()
        .flatten()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("info")
        .to_string();
    directive
}

/// Installs a global subscriber appending to `path`.
///
/// The terminal belongs to the UI, so nothing is ever written to stdout or
/// stderr. Returns `Ok(false)` if a subscriber was already installed.
pub fn init(path: &Path, level: Option<&str>) -> Result<bool, StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = match EnvFilter::try_new(filter_directive(level)) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok();
    Ok(installed)
}
