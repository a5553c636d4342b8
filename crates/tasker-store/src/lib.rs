//! # tasker-store
//!
//! `SQLite` persistence gateway for tasks.
//!
//! [`TaskStore`] owns a pooled database with a migrated schema. Writes are
//! plain async calls; reads are [`Live`] subscriptions that yield the current
//! result immediately and again after every commit.
//!
//! ```text
//! save / delete ──► SQLite ──► commit broadcast ──► live query recompute ──► subscriber
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod live;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use live::{Live, LiveTask, LiveTasks};
pub use store::{StoreConfig, TaskStore};
