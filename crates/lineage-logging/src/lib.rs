//! JSONL logging with graph context for Lineage
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines for log aggregation (default)
//! - **Graph Context**: Tag spans with the network and node being worked on
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use lineage_logging::{LineageSubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! LineageSubscriberBuilder::new().init();
//!
//! // Pretty output while developing
//! LineageSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Graph Context
//!
//! ```ignore
//! use lineage_logging::{GraphContextData, GraphContextGuard};
//!
//! let _guard = GraphContextGuard::new(GraphContextData::network(net));
//! tracing::info_span!("step").in_scope(|| tracing::info!("Stepping"));
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, FilterConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{GraphContextData, GraphContextGuard};
pub use layers::{GraphContextExtension, GraphContextLayer};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors from setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid filter directives: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot create rolling appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("a global subscriber is already set: {0}")]
    AlreadyInitialized(String),
}

/// Builder for configuring and initializing the Lineage logging subscriber
///
/// By default, console output uses JSONL format. Use
/// [`LogConfig::development`] for human-readable output.
#[derive(Debug, Clone, Default)]
pub struct LineageSubscriberBuilder {
    config: LogConfig,
}

impl LineageSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// RUST_LOG if set, the configured directives otherwise
    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.config.directives())?),
        }
    }

    /// Initialize the subscriber globally
    ///
    /// The returned guard flushes file output when dropped and must be kept
    /// alive for the duration of the program. Failures are reported on
    /// stderr and leave the existing subscriber in place.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let filter = self.env_filter()?;

        let (file_writer, guard) = match &self.config.file {
            Some(file) => {
                let (writer, guard) = file_writer(file)?;
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        let console = &self.config.console;
        let pretty = (console.enabled && console.pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(console.ansi)
                .with_target(true)
        });
        let jsonl_console = (console.enabled && !console.pretty)
            .then(|| layers::jsonl_layer(std::io::stdout, &self.config.jsonl));
        let jsonl_file = file_writer.map(|writer| layers::jsonl_layer(writer, &self.config.jsonl));

        Registry::default()
            .with(filter)
            .with(GraphContextLayer::new())
            .with(pretty)
            .with(jsonl_console)
            .with(jsonl_file)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
        Ok(guard)
    }
}

/// Non-blocking writer for the configured file output
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            // Single file, truncated
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.clone())
        .filename_suffix("log");
    if let Some(max) = config.max_files {
        builder = builder.max_log_files(max);
    }
    Ok(tracing_appender::non_blocking(builder.build(&config.directory)?))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() -> Option<WorkerGuard> {
    LineageSubscriberBuilder::new().init()
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() -> Option<WorkerGuard> {
    LineageSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Initialize logging for tests; safe to call from every test
pub fn init_testing() {
    let _ = LineageSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = LineageSubscriberBuilder::new();
        assert_eq!(builder.config().default_level, "info");
        assert!(!builder.config().console.pretty); // JSONL by default
    }

    #[test]
    fn test_builder_with_config() {
        let builder = LineageSubscriberBuilder::new()
            .with_config(LogConfig::development())
            .with_level("trace")
            .with_console(false);
        assert_eq!(builder.config().default_level, "trace");
        assert!(!builder.config().console.enabled);
    }

    #[test]
    fn test_never_rotation_writes_a_single_file() {
        let dir = std::env::temp_dir().join(format!("lineage-logging-{}", uuid::Uuid::new_v4()));
        let config = FileConfig {
            directory: dir.clone(),
            prefix: "run".to_string(),
            rotation: RotationStrategy::Never,
            max_files: None,
        };
        let (_writer, guard) = file_writer(&config).unwrap();
        drop(guard);
        assert!(dir.join("run.log").exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_init_testing_is_repeatable() {
        init_testing();
        init_testing();
    }
}
