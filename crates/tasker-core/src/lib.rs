//! # tasker-core
//!
//! Value types shared by every Tasker layer:
//!
//! - **[`Task`]**: the persisted record. Immutable value data; edits produce a
//!   modified copy that is saved wholesale.
//! - **[`SortOrder`]**: deadline ordering for the task list.
//! - **[`ValidationError`]**: rules a task must satisfy before it is created.

#![deny(unsafe_code)]

pub mod errors;
pub mod sort;
pub mod task;

pub use errors::ValidationError;
pub use sort::SortOrder;
pub use task::{Task, TaskId};
