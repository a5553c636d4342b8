//! Data access seam over the task store.

use std::sync::Arc;

use async_trait::async_trait;
use tasker_core::{SortOrder, Task, TaskId};
use tasker_store::{LiveTask, LiveTasks, Result, TaskStore};
use tracing::instrument;

/// Data access for tasks.
///
/// Writes resolve once committed; reads are live subscriptions that re-emit
/// after every commit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert or replace a task, returning its id.
    async fn save(&self, task: Task) -> Result<TaskId>;

    /// Remove a task; a task that is not stored is a no-op.
    async fn delete(&self, task: &Task) -> Result<()>;

    /// Every task ordered by deadline.
    fn get_all(&self, ascending: bool) -> LiveTasks;

    /// Completed tasks.
    fn get_completed(&self) -> LiveTasks;

    /// One task by id.
    fn get(&self, id: TaskId) -> LiveTask;
}

/// [`TaskRepository`] backed by a shared [`TaskStore`].
#[derive(Clone, Debug)]
pub struct StoreTaskRepository {
    store: Arc<TaskStore>,
}

impl StoreTaskRepository {
    /// Create a repository over `store`.
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskRepository for StoreTaskRepository {
    async fn save(&self, task: Task) -> Result<TaskId> {
        self.store.save(task).await
    }

    async fn delete(&self, task: &Task) -> Result<()> {
        self.store.delete(task).await
    }

    #[instrument(skip(self))]
    fn get_all(&self, ascending: bool) -> LiveTasks {
        self.store.tasks_sorted(SortOrder::from(ascending))
    }

    fn get_completed(&self) -> LiveTasks {
        self.store.tasks_completed()
    }

    fn get(&self, id: TaskId) -> LiveTask {
        self.store.task_by_id(id)
    }
}
