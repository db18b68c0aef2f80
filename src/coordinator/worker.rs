//! Cursor worker: the single execution context of a coordinator
//!
//! Each request runs as a loop over a synchronous decision step. The step
//! either delivers rows from the buffer or asks for one more page; the
//! page fetch is the only await inside a request.

use std::mem;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RequestError, Result};
use crate::source::RowBatchSource;

use super::{CursorStatus, Delivery, Demand, Request};

/// Outcome of one decision step
enum Step<R> {
    Deliver(Delivery<R>),
    FetchPage,
}

pub(super) struct CursorWorker<S: RowBatchSource> {
    source: S,
    requests: mpsc::Receiver<Request<S::Row>>,
    status: watch::Sender<CursorStatus>,
    pages_fetched: u64,
}

impl<S: RowBatchSource> CursorWorker<S> {
    pub(super) fn new(
        source: S,
        requests: mpsc::Receiver<Request<S::Row>>,
        status: watch::Sender<CursorStatus>,
    ) -> Self {
        Self {
            source,
            requests,
            status,
            pages_fetched: 0,
        }
    }

    /// Serve queued requests until every coordinator handle is dropped.
    pub(super) async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let Request {
                id,
                demand,
                cancel,
                reply,
            } = request;

            let outcome = self.serve(id, demand, cancel.as_ref(), &reply).await;
            self.publish();

            match reply.send(outcome) {
                Ok(()) => {}
                Err(Ok(Delivery::Rows(rows))) if !rows.is_empty() => warn!(
                    "Request {} ({}) abandoned after delivery; {} rows lost",
                    id,
                    demand,
                    rows.len()
                ),
                Err(Ok(Delivery::Row(Some(_)))) => {
                    warn!("Request {} ({}) abandoned after delivery; 1 row lost", id, demand)
                }
                Err(_) => debug!("Request {} ({}) abandoned before delivery", id, demand),
            }
        }

        debug!(
            "Cursor worker stopped after {} page fetches",
            self.pages_fetched
        );
    }

    async fn serve(
        &mut self,
        id: Uuid,
        demand: Demand,
        cancel: Option<&CancellationToken>,
        reply: &oneshot::Sender<Result<Delivery<S::Row>>>,
    ) -> Result<Delivery<S::Row>> {
        let mut accumulated = Vec::new();
        let mut rounds = 0u32;

        loop {
            // Checked before every step: a request nobody waits for must
            // not drain rows out of the buffer.
            if let Some(reason) = abandonment(cancel, reply) {
                self.discard(id, demand, &accumulated, reason);
                return Err(RequestError::Cancelled.into());
            }

            match self.step(demand, &mut accumulated, rounds) {
                Step::Deliver(delivery) => {
                    debug!(
                        "Request {} ({}) completed after {} fetch rounds",
                        id, demand, rounds
                    );
                    return Ok(delivery);
                }
                Step::FetchPage => {
                    debug!(
                        "Request {} ({}) fetching page ({} buffered)",
                        id,
                        demand,
                        self.source.available_locally()
                    );
                    if let Err(e) = self.source.fetch_next_page().await {
                        self.discard(id, demand, &accumulated, "failed");
                        warn!("Request {} ({}) page fetch failed: {}", id, demand, e);
                        return Err(e.into());
                    }
                    self.pages_fetched += 1;
                    rounds += 1;
                    self.publish();
                }
            }
        }
    }

    /// Decide, against the current buffer, whether `demand` can be met now.
    fn step(
        &mut self,
        demand: Demand,
        accumulated: &mut Vec<S::Row>,
        rounds: u32,
    ) -> Step<S::Row> {
        let available = self.source.available_locally();
        let fully_fetched = self.source.is_fully_fetched();

        match demand {
            Demand::One => {
                if available > 0 {
                    Step::Deliver(Delivery::Row(self.source.take_one()))
                } else if fully_fetched {
                    Step::Deliver(Delivery::Row(None))
                } else {
                    Step::FetchPage
                }
            }
            Demand::Several(amount) => {
                if available >= amount || fully_fetched {
                    let mut rows = Vec::with_capacity(amount.min(available));
                    self.drain_into(amount.min(available), &mut rows);
                    Step::Deliver(Delivery::Rows(rows))
                } else {
                    Step::FetchPage
                }
            }
            Demand::All => {
                self.drain_into(available, accumulated);
                if fully_fetched {
                    Step::Deliver(Delivery::Rows(mem::take(accumulated)))
                } else {
                    Step::FetchPage
                }
            }
            Demand::FetchMore => {
                if rounds == 0 && !fully_fetched {
                    Step::FetchPage
                } else {
                    Step::Deliver(Delivery::Fetched)
                }
            }
        }
    }

    fn drain_into(&mut self, count: usize, out: &mut Vec<S::Row>) {
        for taken in 0..count {
            match self.source.take_one() {
                Some(row) => out.push(row),
                None => {
                    warn!("Source ran dry after {} of {} reported rows", taken, count);
                    break;
                }
            }
        }
    }

    fn discard(&self, id: Uuid, demand: Demand, accumulated: &[S::Row], reason: &str) {
        if !accumulated.is_empty() {
            warn!(
                "Request {} ({}) {}; discarding {} accumulated rows",
                id,
                demand,
                reason,
                accumulated.len()
            );
        }
    }

    fn publish(&self) {
        self.status.send_replace(CursorStatus::of(&self.source));
    }
}

/// Why a request should stop before its next step, if it should.
fn abandonment<T>(
    cancel: Option<&CancellationToken>,
    reply: &oneshot::Sender<T>,
) -> Option<&'static str> {
    if cancel.is_some_and(|t| t.is_cancelled()) {
        Some("cancelled")
    } else if reply.is_closed() {
        Some("abandoned by caller")
    } else {
        None
    }
}
