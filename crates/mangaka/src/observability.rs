//! # Observability
//!
//! Initializes tracing and logging for `mangaka`. Events from the parser are
//! emitted through the `log` facade and are picked up by the same subscriber.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for initializing the observability system.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// The maximum log level to capture for this crate.
    pub level: Level,
    /// The target for the logs.
    pub target: LogTarget,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            target: LogTarget::default(),
        }
    }
}

/// Defines the output target for logs.
#[derive(Debug, Clone, Default)]
pub enum LogTarget {
    /// Log to the console (stderr).
    #[default]
    Console,
    /// Log to a file.
    File(String),
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` directives are honored; the configured level applies to this crate.
///
/// # Errors
///
/// Returns an error if the level directive cannot be parsed, the log file
/// cannot be created, or a global subscriber is already installed.
pub fn init(config: ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::from_default_env().add_directive(format!("mangaka={}", config.level).parse()?);

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.target {
        LogTarget::Console => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            subscriber.with(layer).try_init()?;
        }
        LogTarget::File(path) => {
            let file = std::fs::File::create(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            subscriber.with(layer).try_init()?;
        }
    };

    Ok(())
}
