//! Validation errors for task values.

use thiserror::Error;

/// A task failed the rules required to create it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The title is empty or whitespace only.
    #[error("task title must not be empty")]
    EmptyTitle,
}
