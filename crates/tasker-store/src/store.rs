//! The task store: persistence gateway over `SQLite`.
//!
//! Writes run on the blocking pool and broadcast a commit sequence number
//! once they have committed. Every live query holds a receiver on that
//! broadcast and recomputes when it fires.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;
use tasker_core::{SortOrder, Task, TaskId};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::errors::Result;
use crate::live::{Live, LiveTask, LiveTasks, spawn_live};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::task::TaskRepo;

/// Tuning for a [`TaskStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Maximum pooled connections for a file database.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Results buffered per live subscriber before the producer waits.
    pub subscriber_buffer: usize,
    /// Commit notifications buffered before slow queries start coalescing.
    pub invalidation_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            busy_timeout_ms: 5_000,
            subscriber_buffer: 1,
            invalidation_capacity: 64,
        }
    }
}

impl StoreConfig {
    fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            pool_size: self.pool_size,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// Persistence gateway for tasks.
///
/// Share it behind an `Arc`. Live queries keep their own pool handle, so a
/// subscription outlives neither its handle nor the store: once the store
/// is dropped, every open subscription yields
/// [`StoreError::SubscriptionClosed`](crate::StoreError::SubscriptionClosed)
/// and ends.
pub struct TaskStore {
    pool: ConnectionPool,
    commits: broadcast::Sender<u64>,
    commit_seq: AtomicU64,
    config: StoreConfig,
}

impl TaskStore {
    /// Open (or create) the database file at `path` and migrate it.
    #[instrument(skip(path, config), fields(path = %path.display()))]
    pub fn open(path: &Path, config: StoreConfig) -> Result<Self> {
        let pool = connection::new_file(path, &config.connection())?;
        Self::from_pool(pool, config)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
        let pool = connection::new_in_memory(&config.connection())?;
        Self::from_pool(pool, config)
    }

    /// Wrap an existing pool, applying pending migrations first.
    pub fn from_pool(pool: ConnectionPool, config: StoreConfig) -> Result<Self> {
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            let journal_mode = connection::journal_mode(&conn)?;
            info!(applied, journal_mode = %journal_mode, "task store ready");
        }
        let (commits, _) = broadcast::channel(config.invalidation_capacity.max(1));
        Ok(Self {
            pool,
            commits,
            commit_seq: AtomicU64::new(0),
            config,
        })
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Insert a new task or replace the stored task with the same id.
    ///
    /// Returns the task's id. Live queries re-emit after the commit.
    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    pub async fn save(&self, task: Task) -> Result<TaskId> {
        let id = self.with_conn(move |conn| TaskRepo::save(conn, &task)).await?;
        self.notify(id);
        Ok(id)
    }

    /// Remove the row with this task's id.
    ///
    /// An unsaved task or one with no stored row is a no-op that leaves
    /// live queries silent.
    #[instrument(skip(self, task), fields(task_id = ?task.id))]
    pub async fn delete(&self, task: &Task) -> Result<()> {
        let Some(id) = task.id else {
            debug!("delete of unsaved task ignored");
            return Ok(());
        };
        if self.with_conn(move |conn| TaskRepo::delete(conn, id)).await? {
            self.notify(id);
        } else {
            debug!("no row to delete");
        }
        Ok(())
    }

    /// Read one task without subscribing.
    pub async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.with_conn(move |conn| TaskRepo::get(conn, id)).await
    }

    /// Number of stored tasks.
    pub async fn count(&self) -> Result<u64> {
        self.with_conn(TaskRepo::count).await
    }

    /// Every task, in insertion order.
    pub fn tasks(&self) -> LiveTasks {
        self.observe("tasks", TaskRepo::list_all)
    }

    /// Every task by deadline, earliest first; missing deadlines lead.
    pub fn tasks_ascending(&self) -> LiveTasks {
        self.tasks_sorted(SortOrder::Ascending)
    }

    /// Every task by deadline, latest first; missing deadlines trail.
    pub fn tasks_descending(&self) -> LiveTasks {
        self.tasks_sorted(SortOrder::Descending)
    }

    /// Every task by deadline in the given order.
    pub fn tasks_sorted(&self, order: SortOrder) -> LiveTasks {
        self.observe("tasks_sorted", move |conn| {
            TaskRepo::list_by_deadline(conn, order)
        })
    }

    /// Completed tasks.
    pub fn tasks_completed(&self) -> LiveTasks {
        self.observe("tasks_completed", TaskRepo::list_completed)
    }

    /// One task by id.
    pub fn task_by_id(&self, id: TaskId) -> LiveTask {
        self.observe("task_by_id", move |conn| TaskRepo::get(conn, id))
    }

    /// Open live queries.
    pub fn subscriber_count(&self) -> usize {
        self.commits.receiver_count()
    }

    /// Commits broadcast since the store was opened.
    pub fn commit_count(&self) -> u64 {
        self.commit_seq.load(Ordering::Relaxed)
    }

    fn observe<T, F>(&self, name: &'static str, query: F) -> Live<T>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
    {
        let commits = self.commits.subscribe();
        debug!(query = name, "live query opened");
        spawn_live(
            name,
            self.pool.clone(),
            commits,
            self.config.subscriber_buffer,
            query,
        )
    }

    fn notify(&self, id: TaskId) {
        let seq = self.commit_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let listeners = self.commits.send(seq).unwrap_or(0);
        debug!(task_id = id, seq, listeners, "commit broadcast");
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("config", &self.config)
            .field("subscribers", &self.subscriber_count())
            .field("commits", &self.commit_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::errors::StoreError;

    const WAIT: Duration = Duration::from_secs(5);

    fn store() -> TaskStore {
        TaskStore::open_in_memory(StoreConfig::default()).unwrap()
    }

    async fn next<T: std::fmt::Debug>(live: &mut Live<T>) -> T {
        tokio::time::timeout(WAIT, live.recv())
            .await
            .expect("timed out waiting for live result")
            .expect("live stream ended")
            .expect("live query failed")
    }

    async fn next_until<T: std::fmt::Debug>(live: &mut Live<T>, pred: impl Fn(&T) -> bool) -> T {
        loop {
            let value = next(live).await;
            if pred(&value) {
                return value;
            }
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn first_emission_is_current_state() {
        let store = store();
        let _ = store.save(Task::new("existing")).await.unwrap();
        let mut live = store.tasks();
        assert_eq!(titles(&next(&mut live).await), vec!["existing"]);
    }

    #[tokio::test]
    async fn save_re_emits() {
        let store = store();
        let mut live = store.tasks();
        assert!(next(&mut live).await.is_empty());

        let id = store.save(Task::new("write tests")).await.unwrap();
        let tasks = next(&mut live).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, Some(id));
    }

    #[tokio::test]
    async fn update_re_emits_with_new_values() {
        let store = store();
        let id = store.save(Task::new("draft")).await.unwrap();
        let mut live = store.task_by_id(id);
        assert_eq!(next(&mut live).await.unwrap().title, "draft");

        let edited = store.get(id).await.unwrap().unwrap().with_title("final");
        let _ = store.save(edited).await.unwrap();
        assert_eq!(next(&mut live).await.unwrap().title, "final");
    }

    #[tokio::test]
    async fn delete_re_emits_and_by_id_goes_empty() {
        let store = store();
        let id = store.save(Task::new("temp")).await.unwrap();
        let task = store.get(id).await.unwrap().unwrap();
        let mut by_id = store.task_by_id(id);
        assert!(next(&mut by_id).await.is_some());

        store.delete(&task).await.unwrap();
        assert_eq!(next(&mut by_id).await, None);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn noop_delete_does_not_emit() {
        let store = store();
        let mut live = store.tasks();
        assert!(next(&mut live).await.is_empty());

        store.delete(&Task::new("never saved")).await.unwrap();
        store.delete(&Task::new("gone").with_id(404)).await.unwrap();
        assert_eq!(store.commit_count(), 0);

        let _ = store.save(Task::new("real")).await.unwrap();
        assert_eq!(titles(&next(&mut live).await), vec!["real"]);
    }

    #[tokio::test]
    async fn sorted_queries_follow_deadlines() {
        let store = store();
        let mut asc = store.tasks_ascending();
        let mut desc = store.tasks_descending();
        assert!(next(&mut asc).await.is_empty());
        assert!(next(&mut desc).await.is_empty());

        for (title, deadline) in [("late", Some(300)), ("none", None), ("early", Some(100))] {
            let _ = store.save(Task::new(title).with_deadline(deadline)).await.unwrap();
        }

        let asc = next_until(&mut asc, |t| t.len() == 3).await;
        let desc = next_until(&mut desc, |t| t.len() == 3).await;
        assert_eq!(titles(&asc), vec!["none", "early", "late"]);
        assert_eq!(titles(&desc), vec!["late", "early", "none"]);
    }

    #[tokio::test]
    async fn completed_query_tracks_flag() {
        let store = store();
        let id = store.save(Task::new("chore")).await.unwrap();
        let mut done = store.tasks_completed();
        assert!(next(&mut done).await.is_empty());

        let task = store.get(id).await.unwrap().unwrap();
        let _ = store.save(task.clone().completed()).await.unwrap();
        assert_eq!(titles(&next(&mut done).await), vec!["chore"]);

        let _ = store.save(task.with_completed(false)).await.unwrap();
        assert!(next(&mut done).await.is_empty());
    }

    #[tokio::test]
    async fn burst_of_commits_converges() {
        let store = store();
        let mut live = store.tasks();
        assert!(next(&mut live).await.is_empty());

        for i in 0..20 {
            let _ = store.save(Task::new(format!("task {i}"))).await.unwrap();
        }
        let tasks = next_until(&mut live, |t| t.len() == 20).await;
        assert_eq!(tasks.last().unwrap().title, "task 19");
    }

    #[tokio::test]
    async fn dropping_handle_releases_subscription() {
        let store = store();
        let mut live = store.tasks();
        let _ = next(&mut live).await;
        assert_eq!(store.subscriber_count(), 1);

        drop(live);
        tokio::time::timeout(WAIT, async {
            while store.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("producer still subscribed");
    }

    #[tokio::test]
    async fn dropping_store_closes_subscriptions() {
        let store = store();
        let mut live = store.tasks();
        let _ = next(&mut live).await;

        drop(store);
        let item = tokio::time::timeout(WAIT, live.recv()).await.unwrap();
        assert_matches!(item, Some(Err(StoreError::SubscriptionClosed(_))));
        assert!(live.recv().await.is_none());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database").join("task.db");

        let id = {
            let store = TaskStore::open(&path, StoreConfig::default()).unwrap();
            store
                .save(Task::new("persisted").with_deadline(Some(1_700_000_000_000)))
                .await
                .unwrap()
        };

        let store = TaskStore::open(&path, StoreConfig::default()).unwrap();
        let task = store.get(id).await.unwrap().unwrap();
        assert_eq!(task.title, "persisted");
        assert_eq!(task.deadline, Some(1_700_000_000_000));
    }
}
