//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every section is `#[serde(default)]`
//! so a settings file only needs the keys it overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "database": { "fileName": "task.db", "poolSize": 4 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskerSettings {
    /// Local database location and connection pool.
    pub database: DatabaseSettings,
    /// Live query delivery.
    pub live: LiveQuerySettings,
    /// One-shot event channels.
    pub events: EventSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Local database location and connection pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Directory holding the database file. Relative paths resolve against
    /// the Tasker home directory.
    pub data_dir: String,
    /// Database file name.
    pub file_name: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            data_dir: "database".to_string(),
            file_name: "task.db".to_string(),
            pool_size: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseSettings {
    /// Full path of the database file, resolving `data_dir` against `home`.
    pub fn database_path(&self, home: &Path) -> PathBuf {
        let dir = Path::new(&self.data_dir);
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            home.join(dir)
        };
        dir.join(&self.file_name)
    }
}

/// Live query delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveQuerySettings {
    /// Result sets buffered per subscriber before the producer waits.
    pub subscriber_buffer: usize,
    /// Commit notifications buffered before slow subscribers coalesce.
    pub invalidation_capacity: usize,
}

impl Default for LiveQuerySettings {
    fn default() -> Self {
        Self {
            subscriber_buffer: 1,
            invalidation_capacity: 64,
        }
    }
}

/// One-shot event channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSettings {
    /// Events buffered per listener.
    pub capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

/// Log output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Per-module overrides, e.g. `tasker_store` => `debug`.
    pub module_levels: BTreeMap<String, String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_levels: BTreeMap::new(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_file_is_task_db() {
        let settings = TaskerSettings::default();
        assert_eq!(settings.database.file_name, "task.db");
        assert_eq!(
            settings.database.database_path(Path::new("/home/u/.tasker")),
            PathBuf::from("/home/u/.tasker/database/task.db")
        );
    }

    #[test]
    fn absolute_data_dir_ignores_home() {
        let db = DatabaseSettings {
            data_dir: "/var/lib/tasker".to_string(),
            ..Default::default()
        };
        assert_eq!(
            db.database_path(Path::new("/home/u/.tasker")),
            PathBuf::from("/var/lib/tasker/task.db")
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TaskerSettings =
            serde_json::from_str(r#"{"database":{"poolSize":2}}"#).unwrap();
        assert_eq!(settings.database.pool_size, 2);
        assert_eq!(settings.database.file_name, "task.db");
        assert_eq!(settings.live, LiveQuerySettings::default());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TaskerSettings::default()).unwrap();
        assert_eq!(json["database"]["busyTimeoutMs"], 5_000);
        assert_eq!(json["live"]["subscriberBuffer"], 1);
        assert_eq!(json["events"]["capacity"], 16);
    }
}
