//! Tracing subscriber setup for binaries and tests embedding the workflow
use super::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    tracing::debug!(level = %config.level, format = ?config.format, "tracing initialised");
    Ok(())
}
