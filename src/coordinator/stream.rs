//! Row streams over a coordinator
//!
//! Streams pull rows with repeated `several` calls, so at most one batch
//! is held by the stream at a time regardless of the result size.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;

use super::FetchCoordinator;

struct StreamState<R> {
    cursor: FetchCoordinator<R>,
    pending: VecDeque<R>,
    batch: usize,
    done: bool,
}

impl<R: Send + 'static> FetchCoordinator<R> {
    /// Stream the remaining rows using the configured batch size.
    pub fn rows(&self) -> BoxStream<'static, Result<R>> {
        self.rows_in_batches(self.stream_batch)
    }

    /// Stream the remaining rows, requesting `batch` rows per round.
    ///
    /// The stream ends once a round comes back short, which only happens
    /// when the result is exhausted. It yields the error of a failed round
    /// and then ends.
    pub fn rows_in_batches(&self, batch: usize) -> BoxStream<'static, Result<R>> {
        let state = StreamState {
            cursor: self.clone(),
            pending: VecDeque::new(),
            batch: batch.max(1),
            done: false,
        };

        stream::try_unfold(state, next_row).boxed()
    }
}

async fn next_row<R: Send + 'static>(
    mut state: StreamState<R>,
) -> Result<Option<(R, StreamState<R>)>> {
    loop {
        if let Some(row) = state.pending.pop_front() {
            return Ok(Some((row, state)));
        }
        if state.done {
            return Ok(None);
        }
        let rows = state.cursor.several(state.batch).await?;
        state.done = rows.len() < state.batch;
        state.pending.extend(rows);
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use tokio::runtime::Handle;

    use crate::config::CursorConfig;
    use crate::coordinator::FetchCoordinator;
    use crate::source::MemorySource;

    fn cursor(rows: Vec<u32>, page_size: usize) -> FetchCoordinator<u32> {
        FetchCoordinator::spawn(
            MemorySource::new(rows, page_size),
            &Handle::current(),
            &CursorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_stream_yields_rows_in_order() {
        let cursor = cursor((1..=7).collect(), 3);
        let rows: Vec<u32> = cursor.rows_in_batches(2).try_collect().await.unwrap();
        assert_eq!(rows, (1..=7).collect::<Vec<_>>());
        assert!(cursor.is_exhausted());
    }

    #[tokio::test]
    async fn test_stream_fold_without_collecting() {
        let cursor = cursor((1..=100).collect(), 10);
        let sum = cursor
            .rows()
            .try_fold(0u64, |acc, row| async move { Ok(acc + row as u64) })
            .await
            .unwrap();
        assert_eq!(sum, 5050);
    }

    #[tokio::test]
    async fn test_stream_over_empty_result() {
        let cursor = cursor(Vec::new(), 10);
        let rows: Vec<u32> = cursor.rows().try_collect().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_stream_continues_after_partial_reads() {
        let cursor = cursor((1..=6).collect(), 4);
        assert_eq!(cursor.one().await.unwrap(), Some(1));

        let rest: Vec<u32> = cursor.rows_in_batches(4).try_collect().await.unwrap();
        assert_eq!(rest, vec![2, 3, 4, 5, 6]);
    }
}
