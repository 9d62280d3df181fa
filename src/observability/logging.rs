//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from logger options
//! - Pretty format for development, JSON for production
//! - Honor RUST_LOG when present

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, LoggerOptions};

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// The configured level is the fallback when RUST_LOG is not set.
pub fn init(options: &LoggerOptions, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    // A subscriber set by an embedding application or an earlier server
    // instance wins; this is not an error.
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
}
