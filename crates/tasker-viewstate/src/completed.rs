//! Controller for the read-only completed-tasks screen.
//!
//! The screen lists every task in ascending deadline order; completed ones
//! are told apart by their flag.

use std::sync::Arc;

use tasker_service::TaskService;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::state::ListState;
use crate::task_list::forward_list;

/// State holder for the completed-tasks screen.
///
/// Must be created inside a Tokio runtime.
pub struct CompletedTasksController {
    tasks_rx: watch::Receiver<ListState>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl CompletedTasksController {
    /// Create a controller and start its live subscription.
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        let cancel = CancellationToken::new();
        let (tasks_tx, tasks_rx) = watch::channel(ListState::Loading);
        let worker = tokio::spawn(forward_list(
            service.get_all(true),
            tasks_tx,
            cancel.child_token(),
        ));
        Self {
            tasks_rx,
            cancel,
            worker: Some(worker),
        }
    }

    /// Every task, earliest deadline first.
    pub fn tasks(&self) -> watch::Receiver<ListState> {
        self.tasks_rx.clone()
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "completed tasks worker failed");
            }
        }
    }
}

impl Drop for CompletedTasksController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CompletedTasksController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletedTasksController")
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}
