//! Live queries.
//!
//! A [`Live`] handle is a stream of query results. It yields the current
//! result as soon as it is opened and a fresh result after every commit that
//! could change it. Each handle owns one producer task: dropping the handle
//! closes its channel and aborts the producer, so no work outlives the
//! subscriber.
//!
//! Commits arrive on a `broadcast` channel. A burst of commits that lands
//! while a result is being computed or delivered collapses into a single
//! recompute, so a slow subscriber sees the latest state and never a backlog.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use rusqlite::Connection;
use tasker_core::Task;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::ConnectionPool;

/// Live list of tasks.
pub type LiveTasks = Live<Vec<Task>>;

/// Live single task; yields `None` while no row has the requested id.
pub type LiveTask = Live<Option<Task>>;

/// A stream of query results that re-emits after every relevant commit.
///
/// After an `Err` item the stream ends.
pub struct Live<T> {
    rx: mpsc::Receiver<Result<T>>,
    producer: Option<JoinHandle<()>>,
}

impl<T> Live<T> {
    /// Wrap a receiver that is fed by something other than the store.
    pub fn from_receiver(rx: mpsc::Receiver<Result<T>>) -> Self {
        Self { rx, producer: None }
    }

    /// A stream that yields the given results and then ends.
    pub fn from_results(results: impl IntoIterator<Item = Result<T>>) -> Self {
        let results: Vec<_> = results.into_iter().collect();
        let (tx, rx) = mpsc::channel(results.len().max(1));
        for result in results {
            let _ = tx.try_send(result);
        }
        Self::from_receiver(rx)
    }

    /// A stream that yields one result and then ends.
    pub fn once(result: Result<T>) -> Self {
        Self::from_results([result])
    }

    /// Next result, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }
}

impl<T> Stream for Live<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Live<T> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl<T> std::fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Live")
            .field("store_backed", &self.producer.is_some())
            .finish_non_exhaustive()
    }
}

/// Open a live query over `pool`.
///
/// `commits` must already be subscribed when this is called; a commit that
/// lands between the subscription and the first read is then still seen.
pub(crate) fn spawn_live<T, F>(
    name: &'static str,
    pool: ConnectionPool,
    commits: broadcast::Receiver<u64>,
    buffer: usize,
    query: F,
) -> Live<T>
where
    T: Send + 'static,
    F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let producer = tokio::spawn(run_live_query(name, pool, commits, tx, Arc::new(query)));
    Live {
        rx,
        producer: Some(producer),
    }
}

async fn run_live_query<T, F>(
    name: &'static str,
    pool: ConnectionPool,
    mut commits: broadcast::Receiver<u64>,
    tx: mpsc::Sender<Result<T>>,
    query: Arc<F>,
) where
    T: Send + 'static,
    F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
{
    loop {
        let result = fetch(&pool, &query).await;
        let failed = result.is_err();
        if let Err(e) = &result {
            warn!(query = name, error = %e, "live query failed");
        }
        if tx.send(result).await.is_err() {
            debug!(query = name, "subscriber gone");
            return;
        }
        if failed {
            return;
        }

        tokio::select! {
            biased;
            () = tx.closed() => {
                debug!(query = name, "subscriber gone");
                return;
            }
            commit = commits.recv() => match commit {
                Ok(seq) => trace!(query = name, seq, "commit observed"),
                Err(RecvError::Lagged(skipped)) => trace!(query = name, skipped, "commits coalesced"),
                Err(RecvError::Closed) => {
                    let _ = tx
                        .send(Err(StoreError::SubscriptionClosed("store dropped".into())))
                        .await;
                    return;
                }
            }
        }

        // One recompute covers every commit already queued.
        loop {
            match commits.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

async fn fetch<T, F>(pool: &ConnectionPool, query: &Arc<F>) -> Result<T>
where
    T: Send + 'static,
    F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
{
    let pool = pool.clone();
    let query = Arc::clone(query);
    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        query(&conn)
    })
    .await?
}
