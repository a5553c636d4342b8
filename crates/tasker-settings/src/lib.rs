//! # tasker-settings
//!
//! Configuration for Tasker, loaded from two layers:
//! 1. **Compiled defaults**: [`TaskerSettings::default()`]
//! 2. **User file**: `~/.tasker/settings.json`, deep-merged over the defaults
//!
//! There are no environment variable overrides.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path, tasker_home};
pub use types::{DatabaseSettings, EventSettings, LiveQuerySettings, LoggingSettings, TaskerSettings};
