//! Logging setup for the application.
//!
//! Installs a global `tracing` subscriber writing to stdout. The level comes
//! from `RUST_LOG` and defaults to `info`.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

static INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(String),
}

/// Initialize tracing. Subsequent calls are no-ops.
pub fn init() -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }
    fmt()
        .with_env_filter(build_env_filter())
        .with_target(false)
        .try_init()
        .map_err(|err| LoggingError::SetGlobal(err.to_string()))?;
    let _ = INITIALIZED.set(());
    tracing::info!("Logging initialized");
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
