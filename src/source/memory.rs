//! In-memory paged result
//!
//! Holds the complete result on the "server" side and hands it out one
//! page per fetch, the way a driver pages through a query whose rows it
//! has not transferred yet.

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;

use super::{ColumnSpec, RowBatchSource};

/// Paged result backed by a vector of rows
///
/// The first page is buffered at construction, as a driver returns it
/// together with the execute response.
#[derive(Debug)]
pub struct MemorySource<R> {
    /// Rows not transferred to the client yet
    remote: VecDeque<R>,
    /// Rows received but not taken
    buffer: VecDeque<R>,
    page_size: usize,
    pages_fetched: usize,
    columns: Vec<ColumnSpec>,
}

impl<R: Send + 'static> MemorySource<R> {
    /// Create a source over `rows` that pages them `page_size` at a time.
    ///
    /// A `page_size` of zero is treated as one.
    pub fn new(rows: Vec<R>, page_size: usize) -> Self {
        let mut source = Self {
            remote: rows.into(),
            buffer: VecDeque::new(),
            page_size: page_size.max(1),
            pages_fetched: 0,
            columns: Vec::new(),
        };
        source.transfer_page();
        source
    }

    /// Attach column metadata to the result.
    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = columns;
        self
    }

    /// Number of pages transferred so far, the first one included.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn transfer_page(&mut self) {
        let count = self.page_size.min(self.remote.len());
        self.buffer.extend(self.remote.drain(..count));
        self.pages_fetched += 1;
    }
}

#[async_trait]
impl<R: Send + 'static> RowBatchSource for MemorySource<R> {
    type Row = R;

    fn available_locally(&self) -> usize {
        self.buffer.len()
    }

    fn is_fully_fetched(&self) -> bool {
        self.remote.is_empty()
    }

    fn take_one(&mut self) -> Option<R> {
        self.buffer.pop_front()
    }

    async fn fetch_next_page(&mut self) -> Result<(), FetchError> {
        if self.remote.is_empty() {
            return Ok(());
        }
        self.transfer_page();
        debug!(
            "Transferred page #{} ({} buffered, {} remote)",
            self.pages_fetched,
            self.buffer.len(),
            self.remote.len()
        );
        Ok(())
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        self.columns.clone()
    }
}
