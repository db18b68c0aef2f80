//! Fetch coordination for paged results
//!
//! A [`FetchCoordinator`] turns a [`RowBatchSource`] into three
//! demand-driven retrieval calls (`one`, `several`, `all`) that fetch
//! further pages only when the buffered rows cannot satisfy the request.
//!
//! The source is owned by a worker task spawned on a runtime handle given
//! at construction. Every retrieval call becomes a request in that
//! worker's queue, so:
//! - at most one page fetch is in flight per cursor
//! - concurrent calls are served one after another, in arrival order
//! - a call's drains never interleave with another call's
//!
//! Handles are cheap to clone; the worker and the source are dropped once
//! the last handle is gone.

mod stream;
mod worker;


use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::config::CursorConfig;
use crate::error::{RequestError, Result};
use crate::source::{ColumnSpec, RowBatchSource};

use worker::CursorWorker;

/// Snapshot of a cursor's buffer and fetch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorStatus {
    /// Rows that can be delivered without fetching
    pub available: usize,
    /// Whether the server reported no further pages
    pub fully_fetched: bool,
    /// Whether no rows remain anywhere
    pub exhausted: bool,
}

impl CursorStatus {
    fn of<S: RowBatchSource>(source: &S) -> Self {
        Self {
            available: source.available_locally(),
            fully_fetched: source.is_fully_fetched(),
            exhausted: source.is_exhausted(),
        }
    }
}

/// What a queued request asks of the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Demand {
    One,
    Several(usize),
    All,
    FetchMore,
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Demand::One => write!(f, "one"),
            Demand::Several(n) => write!(f, "several({n})"),
            Demand::All => write!(f, "all"),
            Demand::FetchMore => write!(f, "fetch_more"),
        }
    }
}

/// Result of a served request
pub(crate) enum Delivery<R> {
    Row(Option<R>),
    Rows(Vec<R>),
    Fetched,
}

impl<R> Delivery<R> {
    fn kind(&self) -> &'static str {
        match self {
            Delivery::Row(_) => "row",
            Delivery::Rows(_) => "rows",
            Delivery::Fetched => "fetched",
        }
    }
}

/// A retrieval request waiting in the worker queue
pub(crate) struct Request<R> {
    pub(crate) id: Uuid,
    pub(crate) demand: Demand,
    pub(crate) cancel: Option<CancellationToken>,
    pub(crate) reply: oneshot::Sender<Result<Delivery<R>>>,
}

/// Demand-driven cursor over a paged result
///
/// # Example
///
/// ```rust
/// use cql_pager::config::CursorConfig;
/// use cql_pager::coordinator::FetchCoordinator;
/// use cql_pager::source::MemorySource;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cql_pager::Result<()> {
/// let source = MemorySource::new(vec!["A", "B", "C", "D", "E"], 3);
/// let cursor = FetchCoordinator::spawn(
///     source,
///     &tokio::runtime::Handle::current(),
///     &CursorConfig::default(),
/// );
///
/// assert_eq!(cursor.several(4).await?, vec!["A", "B", "C", "D"]);
/// assert_eq!(cursor.several(4).await?, vec!["E"]);
/// assert_eq!(cursor.one().await?, None);
/// # Ok(())
/// # }
/// ```
pub struct FetchCoordinator<R> {
    requests: mpsc::Sender<Request<R>>,
    status: watch::Receiver<CursorStatus>,
    columns: Arc<[ColumnSpec]>,
    cancel: Option<CancellationToken>,
    stream_batch: usize,
}

impl<R> Clone for FetchCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            status: self.status.clone(),
            columns: Arc::clone(&self.columns),
            cancel: self.cancel.clone(),
            stream_batch: self.stream_batch,
        }
    }
}

impl<R: Send + 'static> FetchCoordinator<R> {
    /// Take ownership of `source` and start serving requests on `runtime`.
    ///
    /// # Arguments
    /// * `source` - Paged result of an executed query
    /// * `runtime` - Runtime the cursor worker runs on
    /// * `config` - Queue depth and streaming batch size
    pub fn spawn<S>(source: S, runtime: &Handle, config: &CursorConfig) -> Self
    where
        S: RowBatchSource<Row = R>,
    {
        let columns: Arc<[ColumnSpec]> = source.columns().into();
        let (request_tx, request_rx) = mpsc::channel(config.queue_depth.max(1));
        let (status_tx, status_rx) = watch::channel(CursorStatus::of(&source));

        runtime.spawn(CursorWorker::new(source, request_rx, status_tx).run());
        debug!(
            "Spawned cursor worker (queue depth {})",
            config.queue_depth.max(1)
        );

        Self {
            requests: request_tx,
            status: status_rx,
            columns,
            cancel: None,
            stream_batch: config.stream_batch.max(1),
        }
    }

    /// Handle whose requests are abandoned once `token` is cancelled.
    ///
    /// Cancelling never aborts a page fetch already issued; the worker
    /// lets it finish, keeps the rows buffered, and drops the request.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut handle = self.clone();
        handle.cancel = Some(token);
        handle
    }

    /// Next row of the result, or `None` once the result is exhausted.
    ///
    /// Fetches pages only while nothing is buffered and more pages exist.
    pub async fn one(&self) -> Result<Option<R>> {
        match self.submit(Demand::One).await? {
            Delivery::Row(row) => Ok(row),
            other => Err(unexpected(Demand::One, &other)),
        }
    }

    /// Up to `amount` rows, in result order.
    ///
    /// Returns fewer rows only when the result has fewer left. On a fetch
    /// failure no rows are delivered for this call.
    pub async fn several(&self, amount: usize) -> Result<Vec<R>> {
        if amount == 0 {
            return Err(RequestError::InvalidAmount(amount).into());
        }
        let demand = Demand::Several(amount);
        match self.submit(demand).await? {
            Delivery::Rows(rows) => Ok(rows),
            other => Err(unexpected(demand, &other)),
        }
    }

    /// Every remaining row of the result, in order.
    ///
    /// Memory use grows with the size of the result: all remaining rows
    /// are held until the last page arrives. Prefer [`several`] or
    /// [`rows`] for large results. On a fetch failure the rows gathered
    /// by this call are discarded.
    ///
    /// [`several`]: FetchCoordinator::several
    /// [`rows`]: FetchCoordinator::rows
    pub async fn all(&self) -> Result<Vec<R>> {
        match self.submit(Demand::All).await? {
            Delivery::Rows(rows) => Ok(rows),
            other => Err(unexpected(Demand::All, &other)),
        }
    }

    /// Fetch one more page into the buffer without taking any rows.
    ///
    /// Does nothing when the result is already fully fetched.
    pub async fn fetch_more(&self) -> Result<()> {
        match self.submit(Demand::FetchMore).await? {
            Delivery::Fetched => Ok(()),
            other => Err(unexpected(Demand::FetchMore, &other)),
        }
    }

    /// Latest published buffer and fetch state.
    ///
    /// Updated by the worker after every page fetch and before every
    /// reply, so it already reflects any call the caller has awaited.
    pub fn status(&self) -> CursorStatus {
        *self.status.borrow()
    }

    /// Rows buffered locally, deliverable without a round-trip.
    pub fn available_without_fetching(&self) -> usize {
        self.status().available
    }

    /// Whether the server has no more pages for this result.
    pub fn is_fully_fetched(&self) -> bool {
        self.status().fully_fetched
    }

    /// Whether every row of the result has been delivered.
    pub fn is_exhausted(&self) -> bool {
        self.status().exhausted
    }

    /// Column metadata reported by the source.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    async fn submit(&self, demand: Demand) -> Result<Delivery<R>> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(RequestError::Cancelled.into());
        }

        let (reply, response) = oneshot::channel();
        let request = Request {
            id: Uuid::new_v4(),
            demand,
            cancel: self.cancel.clone(),
            reply,
        };
        self.requests
            .send(request)
            .await
            .map_err(|_| RequestError::CoordinatorClosed)?;

        let received = match &self.cancel {
            Some(token) => tokio::select! {
                received = response => received,
                _ = token.cancelled() => return Err(RequestError::Cancelled.into()),
            },
            None => response.await,
        };
        received.map_err(|_| RequestError::CoordinatorClosed)?
    }
}

fn unexpected<R>(demand: Demand, delivery: &Delivery<R>) -> crate::error::PagerError {
    RequestError::UnexpectedReply(format!("{demand} answered with {}", delivery.kind())).into()
}
