//! The task entity.
//!
//! A [`Task`] is plain value data. It is never edited in place once loaded:
//! callers build a modified copy with the `with_*` methods and hand the whole
//! value back to `save`, which upserts it by primary key.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Store-assigned primary key.
pub type TaskId = i64;

/// A to-do item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Primary key. `None` until the task is first saved.
    pub id: Option<TaskId>,
    /// Short title. Required to be non-blank for creation.
    pub title: String,
    /// Free-form details.
    #[serde(default)]
    pub description: String,
    /// Deadline in milliseconds since the Unix epoch.
    #[serde(default)]
    pub deadline: Option<i64>,
    /// Whether the task has been completed.
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// A new, unsaved task with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether the store has assigned an id to this task.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Copy with a different id.
    #[must_use]
    pub fn with_id(self, id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Copy with a different title.
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    /// Copy with a different description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    /// Copy with a different deadline (epoch millis).
    #[must_use]
    pub fn with_deadline(self, deadline: Option<i64>) -> Self {
        Self { deadline, ..self }
    }

    /// Copy with a deadline given as a UTC timestamp.
    #[must_use]
    pub fn with_deadline_at(self, deadline: Option<DateTime<Utc>>) -> Self {
        self.with_deadline(deadline.map(|at| at.timestamp_millis()))
    }

    /// Copy with a different completion flag.
    #[must_use]
    pub fn with_completed(self, is_completed: bool) -> Self {
        Self {
            is_completed,
            ..self
        }
    }

    /// Copy marked as completed.
    #[must_use]
    pub fn completed(self) -> Self {
        self.with_completed(true)
    }

    /// The deadline as a UTC timestamp, if set and representable.
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        self.deadline
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    /// Check the rules for creating a new task.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}
