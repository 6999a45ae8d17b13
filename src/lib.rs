pub mod commands;
pub mod config;
pub mod docupipe;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod poller;
pub mod qa;
pub mod session;

use tracing_subscriber::EnvFilter;

pub use config::{Config, ConfigError, Settings};
pub use error::UpstreamError;
pub use pipeline::{Pipeline, PipelineError, PipelineReport, Stage};
pub use session::Session;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the built-in default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}
