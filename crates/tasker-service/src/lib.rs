//! # tasker-service
//!
//! The seams between presentation and storage:
//!
//! - **[`TaskRepository`]**: narrows the gateway to the operations screens
//!   use. [`StoreTaskRepository`] forwards to a shared [`TaskStore`].
//! - **[`TaskService`]**: the facade controllers depend on.
//!   [`DefaultTaskService`] checks new tasks before they reach storage.
//!
//! [`TaskStore`]: tasker_store::TaskStore

#![deny(unsafe_code)]

pub mod repository;
pub mod service;

pub use repository::{StoreTaskRepository, TaskRepository};
pub use service::{DefaultTaskService, TaskService};

