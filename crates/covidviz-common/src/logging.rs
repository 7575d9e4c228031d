//! Structured logging setup shared by the covidviz binaries.

use crate::{CovidVizError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "covidviz_graphs=trace")
    pub level: String,
    /// Whether to emit one JSON object per line
    pub json_format: bool,
    /// Whether to include target module information
    pub include_targets: bool,
    /// Whether to colorize output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_targets: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Builds the filter, letting `RUST_LOG` take precedence over `level`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Events are written to standard output, so both the success and the failure
/// path of a run leave their diagnostics there.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let outcome = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_target(config.include_targets),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(config.ansi)
                    .with_target(config.include_targets),
            )
            .try_init()
    };

    outcome.map_err(|e| CovidVizError::config_with_source("Failed to initialize logging", e))
}
