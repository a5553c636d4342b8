//! Settings loading.
//!
//! 1. Start with compiled [`TaskerSettings::default()`]
//! 2. If `~/.tasker/settings.json` exists, deep-merge its values over the defaults
//! 3. Validate the result
//!
//! Merge rules: objects merge per key, everything else is replaced, and
//! `null` in the file keeps the default.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::TaskerSettings;

/// Tasker home directory (`~/.tasker`).
pub fn tasker_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tasker")
}

/// Path of the settings file (`~/.tasker/settings.json`).
pub fn settings_path() -> PathBuf {
    tasker_home().join("settings.json")
}

/// Load settings from the default path.
pub fn load_settings() -> Result<TaskerSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file. A missing file yields the defaults.
pub fn load_settings_from_path(path: &Path) -> Result<TaskerSettings> {
    let defaults = serde_json::to_value(TaskerSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let settings: TaskerSettings = serde_json::from_value(merged)?;
    validate(&settings)?;
    Ok(settings)
}

/// Merge `source` over `target` recursively.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut merged), Value::Object(overrides)) => {
            for (key, value) in overrides {
                if value.is_null() {
                    continue;
                }
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, source) => source,
    }
}

fn validate(settings: &TaskerSettings) -> Result<()> {
    if settings.database.pool_size == 0 {
        return Err(SettingsError::InvalidValue(
            "database.poolSize must be at least 1".to_string(),
        ));
    }
    if settings.database.file_name.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "database.fileName must not be empty".to_string(),
        ));
    }
    if settings.live.subscriber_buffer == 0 || settings.live.invalidation_capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "live channel sizes must be at least 1".to_string(),
        ));
    }
    if settings.events.capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "events.capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}
