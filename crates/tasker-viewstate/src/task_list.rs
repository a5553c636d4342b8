//! Controller for the main task list screen.
//!
//! Two background workers feed `watch` channels: one follows the sort order
//! and re-subscribes the sorted list whenever it changes, the other forwards
//! the completed list. Both stop when the controller is dropped or shut down.

use std::sync::Arc;

use tasker_core::{SortOrder, Task, TaskId};
use tasker_service::TaskService;
use tasker_store::{LiveTasks, Result};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::events::{EventEmitter, ShowCompletedRequested, TaskSaved};
use crate::state::ListState;

/// Default capacity of the one-shot event channels.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// State holder for the task list screen.
///
/// Must be created inside a Tokio runtime.
pub struct TaskListController {
    service: Arc<dyn TaskService>,
    sort_tx: watch::Sender<SortOrder>,
    tasks_rx: watch::Receiver<ListState>,
    completed_rx: watch::Receiver<ListState>,
    saved: EventEmitter<TaskSaved>,
    show_completed: EventEmitter<ShowCompletedRequested>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl TaskListController {
    /// Create a controller and start its live subscriptions.
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self::with_event_capacity(service, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a controller with a custom event channel capacity.
    pub fn with_event_capacity(service: Arc<dyn TaskService>, capacity: usize) -> Self {
        let cancel = CancellationToken::new();
        let (sort_tx, sort_rx) = watch::channel(SortOrder::default());
        let (tasks_tx, tasks_rx) = watch::channel(ListState::Loading);
        let (completed_tx, completed_rx) = watch::channel(ListState::Loading);

        let workers = vec![
            tokio::spawn(follow_sort_order(
                Arc::clone(&service),
                sort_rx,
                tasks_tx,
                cancel.child_token(),
            )),
            tokio::spawn(forward_list(
                service.get_completed(),
                completed_tx,
                cancel.child_token(),
            )),
        ];

        Self {
            service,
            sort_tx,
            tasks_rx,
            completed_rx,
            saved: EventEmitter::with_capacity(capacity),
            show_completed: EventEmitter::with_capacity(capacity),
            cancel,
            workers,
        }
    }

    /// Flip the deadline order and return the new one.
    ///
    /// The sorted list re-subscribes in the new order; the previous
    /// subscription is dropped first.
    pub fn toggle_sort(&self) -> SortOrder {
        self.sort_tx.send_modify(|order| *order = order.toggled());
        let order = *self.sort_tx.borrow();
        debug!(%order, "sort toggled");
        order
    }

    /// Current deadline order.
    pub fn sort_order(&self) -> SortOrder {
        *self.sort_tx.borrow()
    }

    /// Whether the list is sorted earliest deadline first.
    pub fn sort_ascending(&self) -> bool {
        self.sort_order().is_ascending()
    }

    /// Save a task, then announce it with [`TaskSaved`].
    ///
    /// On error nothing is announced.
    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    pub async fn save(&self, task: Task) -> Result<TaskId> {
        let id = self.service.save(task).await?;
        let _ = self.saved.emit(TaskSaved { id });
        Ok(id)
    }

    /// Delete a task.
    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    pub async fn delete(&self, task: &Task) -> Result<()> {
        self.service.delete(task).await
    }

    /// Ask for the completed-tasks screen.
    pub fn request_show_completed(&self) {
        let listeners = self.show_completed.emit(ShowCompletedRequested);
        debug!(listeners, "show completed requested");
    }

    /// The sorted task list.
    pub fn tasks(&self) -> watch::Receiver<ListState> {
        self.tasks_rx.clone()
    }

    /// The completed tasks.
    pub fn completed_tasks(&self) -> watch::Receiver<ListState> {
        self.completed_rx.clone()
    }

    /// Receive [`TaskSaved`] events emitted from now on.
    pub fn saved_events(&self) -> broadcast::Receiver<TaskSaved> {
        self.saved.subscribe()
    }

    /// Receive [`ShowCompletedRequested`] events emitted from now on.
    pub fn show_completed_events(&self) -> broadcast::Receiver<ShowCompletedRequested> {
        self.show_completed.subscribe()
    }

    /// Stop both workers and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        debug!(
            saved_emitted = self.saved.emit_count(),
            saved_listeners = self.saved.subscriber_count(),
            show_completed_emitted = self.show_completed.emit_count(),
            "task list shutting down"
        );
        for worker in std::mem::take(&mut self.workers) {
            if let Err(e) = worker.await {
                warn!(error = %e, "task list worker failed");
            }
        }
    }
}

impl Drop for TaskListController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for TaskListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskListController")
            .field("sort_order", &self.sort_order())
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

/// Keep `state` on the sorted list for the current order in `sort_rx`.
async fn follow_sort_order(
    service: Arc<dyn TaskService>,
    mut sort_rx: watch::Receiver<SortOrder>,
    state: watch::Sender<ListState>,
    cancel: CancellationToken,
) {
    let mut generation = 0u64;
    loop {
        let order = *sort_rx.borrow_and_update();
        generation += 1;
        let mut live = service.get_all(order.is_ascending());
        debug!(%order, generation, "task list subscribed");

        let resubscribe = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = sort_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break true;
                }
                item = live.recv() => match item {
                    Some(Ok(tasks)) => {
                        let _ = state.send_replace(ListState::Loaded {
                            order: Some(order),
                            generation,
                            tasks,
                        });
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, %order, "task list subscription failed");
                        let _ = state.send_replace(ListState::Failed(Arc::new(e)));
                        break false;
                    }
                    None => break false,
                },
            }
        };
        drop(live);

        if !resubscribe {
            // Stay on the last published state until the order changes.
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = sort_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Forward every result of `live` into `state` until it ends or fails.
pub(crate) async fn forward_list(mut live: LiveTasks, state: watch::Sender<ListState>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            item = live.recv() => match item {
                Some(Ok(tasks)) => {
                    let _ = state.send_replace(ListState::Loaded {
                        order: None,
                        generation: 1,
                        tasks,
                    });
                }
                Some(Err(e)) => {
                    warn!(error = %e, "completed list subscription failed");
                    let _ = state.send_replace(ListState::Failed(Arc::new(e)));
                    return;
                }
                None => return,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use tasker_service::{DefaultTaskService, StoreTaskRepository};
    use tasker_store::{Live, LiveTask, StoreConfig, StoreError, TaskStore};
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn store_service() -> (Arc<TaskStore>, Arc<dyn TaskService>) {
        let store = Arc::new(TaskStore::open_in_memory(StoreConfig::default()).unwrap());
        let repository = Arc::new(StoreTaskRepository::new(Arc::clone(&store)));
        (store, Arc::new(DefaultTaskService::new(repository)))
    }

    async fn wait_for(
        rx: &mut watch::Receiver<ListState>,
        pred: impl FnMut(&ListState) -> bool,
    ) -> ListState {
        tokio::time::timeout(WAIT, rx.wait_for(pred))
            .await
            .expect("timed out waiting for list state")
            .expect("controller gone")
            .clone()
    }

    async fn wait_for_subscribers(store: &TaskStore, expected: usize) {
        tokio::time::timeout(WAIT, async {
            while store.subscriber_count() != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("live query count did not settle");
    }

    fn titles(state: &ListState) -> Vec<String> {
        state
            .tasks()
            .unwrap_or_default()
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    struct FailingService;

    #[async_trait]
    impl TaskService for FailingService {
        async fn save(&self, _task: Task) -> Result<TaskId> {
            Err(StoreError::Internal("disk full".into()))
        }

        async fn delete(&self, _task: &Task) -> Result<()> {
            Err(StoreError::Internal("disk full".into()))
        }

        fn get_all(&self, _ascending: bool) -> LiveTasks {
            Live::once(Err(StoreError::Internal("query failed".into())))
        }

        fn get_completed(&self) -> LiveTasks {
            Live::once(Err(StoreError::Internal("query failed".into())))
        }

        fn get(&self, _id: TaskId) -> LiveTask {
            Live::once(Ok(None))
        }
    }

    #[tokio::test]
    async fn starts_ascending_and_loads() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        assert!(controller.sort_ascending());

        let mut tasks = controller.tasks();
        let state = wait_for(&mut tasks, |s| !s.is_loading()).await;
        assert_eq!(state.order(), Some(SortOrder::Ascending));
        assert_eq!(state.generation(), Some(1));
        assert!(state.tasks().unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_twice_restores_order() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        assert_eq!(controller.toggle_sort(), SortOrder::Descending);
        assert!(!controller.sort_ascending());
        assert_eq!(controller.toggle_sort(), SortOrder::Ascending);
        assert!(controller.sort_ascending());
    }

    #[tokio::test]
    async fn toggle_resubscribes_without_stale_results() {
        let (store, service) = store_service();
        for (title, deadline) in [("b", Some(20)), ("none", None), ("a", Some(10))] {
            let _ = store.save(Task::new(title).with_deadline(deadline)).await.unwrap();
        }
        let controller = TaskListController::new(service);
        let mut tasks = controller.tasks();

        let first = wait_for(&mut tasks, |s| s.tasks().is_some_and(|t| t.len() == 3)).await;
        assert_eq!(titles(&first), vec!["none", "a", "b"]);
        let first_generation = first.generation().unwrap();

        let _ = controller.toggle_sort();
        let flipped = wait_for(&mut tasks, |s| {
            s.generation().is_some_and(|g| g > first_generation)
        })
        .await;
        assert_eq!(flipped.order(), Some(SortOrder::Descending));
        assert_eq!(titles(&flipped), vec!["b", "a", "none"]);

        // Later commits only reach the new subscription.
        let _ = controller.save(Task::new("c").with_deadline(Some(30))).await.unwrap();
        let updated = wait_for(&mut tasks, |s| s.tasks().is_some_and(|t| t.len() == 4)).await;
        assert_eq!(updated.generation(), flipped.generation());
        assert_eq!(titles(&updated), vec!["c", "b", "a", "none"]);
        wait_for_subscribers(&store, 2).await;
    }

    #[tokio::test]
    async fn save_emits_saved_event_after_commit() {
        let (store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut saved = controller.saved_events();

        let id = controller.save(Task::new("ship it")).await.unwrap();
        assert_eq!(saved.try_recv(), Ok(TaskSaved { id }));
        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_save_emits_nothing() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut saved = controller.saved_events();

        let err = controller.save(Task::new("")).await.unwrap_err();
        assert_matches!(err, StoreError::Validation(_));
        assert_eq!(saved.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn saved_event_not_replayed_to_late_subscriber() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        let _ = controller.save(Task::new("early")).await.unwrap();

        let mut late = controller.saved_events();
        assert_eq!(late.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn delete_updates_lists_and_emits_nothing() {
        let (store, service) = store_service();
        let id = store.save(Task::new("done").completed()).await.unwrap();
        let task = store.get(id).await.unwrap().unwrap();

        let controller = TaskListController::new(service);
        let mut saved = controller.saved_events();
        let mut completed = controller.completed_tasks();
        let _ = wait_for(&mut completed, |s| s.tasks().is_some_and(|t| t.len() == 1)).await;

        controller.delete(&task).await.unwrap();
        let _ = wait_for(&mut completed, |s| s.tasks().is_some_and(<[Task]>::is_empty)).await;
        assert_eq!(saved.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn completed_list_tracks_completion() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut completed = controller.completed_tasks();
        let _ = wait_for(&mut completed, |s| !s.is_loading()).await;

        let id = controller.save(Task::new("chore")).await.unwrap();
        let _ = controller
            .save(Task::new("chore").with_id(id).completed())
            .await
            .unwrap();
        let state = wait_for(&mut completed, |s| s.tasks().is_some_and(|t| t.len() == 1)).await;
        assert_eq!(state.order(), None);
        assert_eq!(titles(&state), vec!["chore"]);
    }

    #[tokio::test]
    async fn show_completed_request_is_one_shot() {
        let (_store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut events = controller.show_completed_events();

        controller.request_show_completed();
        assert_eq!(events.try_recv(), Ok(ShowCompletedRequested));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn subscription_failure_is_published() {
        let controller = TaskListController::new(Arc::new(FailingService));
        let mut tasks = controller.tasks();
        let mut completed = controller.completed_tasks();

        let state = wait_for(&mut tasks, |s| s.error().is_some()).await;
        assert_matches!(state.error(), Some(StoreError::Internal(_)));
        let _ = wait_for(&mut completed, |s| s.error().is_some()).await;

        assert_matches!(
            controller.save(Task::new("x")).await,
            Err(StoreError::Internal(_))
        );
    }

    #[tokio::test]
    async fn toggle_after_failure_resubscribes() {
        let controller = TaskListController::new(Arc::new(FailingService));
        let mut tasks = controller.tasks();
        let _ = wait_for(&mut tasks, |s| s.error().is_some()).await;

        let _ = controller.toggle_sort();
        tokio::time::timeout(WAIT, tasks.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(tasks.borrow().error().is_some());
    }

    #[tokio::test]
    async fn shutdown_releases_subscriptions() {
        let (store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut tasks = controller.tasks();
        let _ = wait_for(&mut tasks, |s| !s.is_loading()).await;
        assert_eq!(store.subscriber_count(), 2);

        controller.shutdown().await;
        wait_for_subscribers(&store, 0).await;
    }

    #[tokio::test]
    async fn drop_releases_subscriptions() {
        let (store, service) = store_service();
        let controller = TaskListController::new(service);
        let mut tasks = controller.tasks();
        let mut completed = controller.completed_tasks();
        let _ = wait_for(&mut tasks, |s| !s.is_loading()).await;
        let _ = wait_for(&mut completed, |s| !s.is_loading()).await;
        assert_eq!(store.subscriber_count(), 2);

        drop(controller);
        wait_for_subscribers(&store, 0).await;
    }
}
