//! `SQLite` backend for the task store.
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode and pragmas applied to
//!   every connection.
//! - **[`migrations`]**: version-tracked schema, embedded at compile time.
//! - **[`repositories`]**: stateless SQL, one struct per table.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{ConnectionConfig, ConnectionPool, journal_mode, new_file, new_in_memory};
pub use migrations::{current_version, latest_version, run_migrations};
