//! Task service: the facade screens depend on.
//!
//! New tasks are checked here before they reach storage.

use std::sync::Arc;

use async_trait::async_trait;
use tasker_core::{Task, TaskId};
use tasker_store::{LiveTask, LiveTasks, Result};
use tracing::{debug, instrument};

use crate::repository::TaskRepository;

/// Task operations used by the presentation layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Insert or replace a task, returning its id.
    async fn save(&self, task: Task) -> Result<TaskId>;

    /// Remove a task.
    async fn delete(&self, task: &Task) -> Result<()>;

    /// Every task ordered by deadline.
    fn get_all(&self, ascending: bool) -> LiveTasks;

    /// Completed tasks.
    fn get_completed(&self) -> LiveTasks;

    /// One task by id.
    fn get(&self, id: TaskId) -> LiveTask;
}

/// [`TaskService`] over a [`TaskRepository`].
///
/// A new task (no id yet) must have a non-blank title.
#[derive(Clone)]
pub struct DefaultTaskService {
    repository: Arc<dyn TaskRepository>,
}

impl DefaultTaskService {
    /// Create a service over `repository`.
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

impl std::fmt::Debug for DefaultTaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultTaskService").finish_non_exhaustive()
    }
}

#[async_trait]
impl TaskService for DefaultTaskService {
    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    async fn save(&self, task: Task) -> Result<TaskId> {
        if !task.is_persisted() {
            task.validate_for_create()?;
        }
        let id = self.repository.save(task).await?;
        debug!(task_id = id, "task saved");
        Ok(id)
    }

    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    async fn delete(&self, task: &Task) -> Result<()> {
        self.repository.delete(task).await
    }

    fn get_all(&self, ascending: bool) -> LiveTasks {
        self.repository.get_all(ascending)
    }

    fn get_completed(&self) -> LiveTasks {
        self.repository.get_completed()
    }

    fn get(&self, id: TaskId) -> LiveTask {
        self.repository.get(id)
    }
}
