//! # tasker
//!
//! Builds the object graph once, at startup:
//!
//! ```text
//! TaskerSettings ─► TaskStore ─► StoreTaskRepository ─► DefaultTaskService ─► controllers
//! ```
//!
//! [`App`] owns the single store and service instances; every controller it
//! hands out shares them.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tasker_service::{DefaultTaskService, StoreTaskRepository};
use tasker_store::{StoreConfig, TaskStore};
use tasker_viewstate::{CompletedTasksController, TaskListController};
use tracing::info;

pub use tasker_core::{SortOrder, Task, TaskId};
pub use tasker_service::TaskService;
pub use tasker_settings::TaskerSettings;
pub use tasker_store::{Live, LiveTask, LiveTasks, StoreError};
pub use tasker_viewstate::{ListState, ShowCompletedRequested, TaskSaved};

/// The wired application.
pub struct App {
    settings: TaskerSettings,
    database_path: Option<PathBuf>,
    store: Arc<TaskStore>,
    service: Arc<dyn TaskService>,
}

impl App {
    /// Load settings from `~/.tasker`, install logging, and open the store.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn bootstrap() -> Result<Self> {
        let settings = tasker_settings::load_settings().context("failed to load settings")?;
        let _ = tasker_logging::init_logging(&settings.logging);
        Self::open(settings)
    }

    /// Open the database under `~/.tasker`.
    pub fn open(settings: TaskerSettings) -> Result<Self> {
        Self::open_at(settings, &tasker_settings::tasker_home())
    }

    /// Open the database with `data_dir` resolved against `home`.
    pub fn open_at(settings: TaskerSettings, home: &Path) -> Result<Self> {
        let path = settings.database.database_path(home);
        let store = TaskStore::open(&path, store_config(&settings))
            .with_context(|| format!("failed to open task database at {}", path.display()))?;
        info!(path = %path.display(), "tasker ready");
        Ok(Self::assemble(settings, Some(path), store))
    }

    /// Wire everything over a private in-memory database.
    pub fn open_in_memory(settings: TaskerSettings) -> Result<Self> {
        let store = TaskStore::open_in_memory(store_config(&settings))
            .context("failed to open in-memory task database")?;
        Ok(Self::assemble(settings, None, store))
    }

    fn assemble(settings: TaskerSettings, database_path: Option<PathBuf>, store: TaskStore) -> Self {
        let store = Arc::new(store);
        let repository = Arc::new(StoreTaskRepository::new(Arc::clone(&store)));
        let service: Arc<dyn TaskService> = Arc::new(DefaultTaskService::new(repository));
        Self {
            settings,
            database_path,
            store,
            service,
        }
    }

    /// Settings the app was opened with.
    pub fn settings(&self) -> &TaskerSettings {
        &self.settings
    }

    /// Database file, or `None` for an in-memory app.
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// The shared task service.
    pub fn service(&self) -> Arc<dyn TaskService> {
        Arc::clone(&self.service)
    }

    /// A controller for the task list screen.
    pub fn task_list_controller(&self) -> TaskListController {
        TaskListController::with_event_capacity(self.service(), self.settings.events.capacity)
    }

    /// A controller for the completed-tasks screen.
    pub fn completed_tasks_controller(&self) -> CompletedTasksController {
        CompletedTasksController::new(self.service())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("database_path", &self.database_path)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn store_config(settings: &TaskerSettings) -> StoreConfig {
    StoreConfig {
        pool_size: settings.database.pool_size,
        busy_timeout_ms: settings.database.busy_timeout_ms,
        subscriber_buffer: settings.live.subscriber_buffer,
        invalidation_capacity: settings.live.invalidation_capacity,
    }
}
