//! Repository implementations for `SQLite` database operations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`,
//! so every operation runs unchanged on a pooled or a bare connection.

pub mod task;
