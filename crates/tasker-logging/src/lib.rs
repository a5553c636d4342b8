//! # tasker-logging
//!
//! Installs the global `tracing` subscriber: an [`EnvFilter`] built from
//! [`LoggingSettings`] (or `RUST_LOG` when set) feeding either a JSON or a
//! human-readable fmt layer.

#![deny(unsafe_code)]

use tasker_settings::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the filter directive string, e.g. `info,tasker_store=debug`.
pub fn filter_directive(settings: &LoggingSettings) -> String {
    let mut directive = settings.level.to_lowercase();
    for (module, level) in &settings.module_levels {
        directive.push(',');
        directive.push_str(module);
        directive.push('=');
        directive.push_str(&level.to_lowercase());
    }
    directive
}

/// Filter from `RUST_LOG`, falling back to the configured levels.
pub fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(settings)))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, which makes it safe
/// to call from tests and from more than one composition root.
pub fn init_logging(settings: &LoggingSettings) -> bool {
    let filter = build_filter(settings);

    let fmt_layer = if settings.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(filter)
            .boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(directive = %filter_directive(settings), json = settings.json, "logging initialized");
    }
    installed
}
