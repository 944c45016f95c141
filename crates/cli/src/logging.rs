//! Logging setup
//!
//! Logs go to stderr so command output on stdout stays clean.
//! `MEDIQUEUE_LOG_FORMAT=json` switches to structured JSON lines.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "mediqueue=warn";

pub fn init(verbose: bool) -> Result<()> {
    let log_format = std::env::var("MEDIQUEUE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let default_filter = if verbose { "mediqueue=debug" } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("Failed to create env filter: {}", e))?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            // Interactive: multi-line human-readable output
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
