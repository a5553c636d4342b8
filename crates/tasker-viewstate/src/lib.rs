//! # tasker-viewstate
//!
//! Screen controllers. Each one holds its screen's state as `watch` channels
//! fed by live subscriptions, and exposes one-shot events as `broadcast`
//! receivers.
//!
//! - **[`TaskListController`]**: sorted task list with a sort toggle,
//!   completed list, save/delete, and the "task saved" and "show completed"
//!   events.
//! - **[`CompletedTasksController`]**: read-only list of every task.

#![deny(unsafe_code)]

pub mod completed;
pub mod events;
pub mod state;
pub mod task_list;

pub use completed::CompletedTasksController;
pub use events::{EventEmitter, ShowCompletedRequested, TaskSaved};
pub use state::ListState;
pub use task_list::{DEFAULT_EVENT_CAPACITY, TaskListController};
