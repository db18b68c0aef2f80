//! JSON Lines backed paged result
//!
//! Replays a result set stored as one JSON document per line. Each fetch
//! reads the next `page_size` lines from the file, so only the pages
//! requested so far are ever held in memory.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use crate::error::{FetchError, Result};

use super::{ColumnSpec, RowBatchSource};

/// Paged result reading rows from a JSON Lines file
pub struct JsonLinesSource {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    page_size: usize,
    /// Decoded rows not taken yet
    buffer: VecDeque<Value>,
    /// Raw lines of the page being fetched, with their line numbers.
    /// Kept across a failed fetch so a retry does not skip them.
    pending: Vec<(usize, String)>,
    line_no: usize,
    eof: bool,
    columns: Vec<ColumnSpec>,
}

impl JsonLinesSource {
    /// Open `path` and buffer its first page.
    ///
    /// # Arguments
    /// * `path` - JSON Lines file, one row per line
    /// * `page_size` - Number of lines read per fetch (zero is treated as one)
    pub async fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;

        let mut source = Self {
            lines: BufReader::new(file).lines(),
            path,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            pending: Vec::new(),
            line_no: 0,
            eof: false,
            columns: Vec::new(),
        };
        source.fetch_next_page().await?;
        source.columns = source.buffer.front().map(infer_columns).unwrap_or_default();

        info!(
            "Opened {} with page size {}",
            source.path.display(),
            source.page_size
        );
        Ok(source)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_page_lines(&mut self) -> std::result::Result<(), FetchError> {
        while !self.eof && self.pending.len() < self.page_size {
            match self.lines.next_line().await? {
                Some(line) => {
                    self.line_no += 1;
                    if !line.trim().is_empty() {
                        self.pending.push((self.line_no, line));
                    }
                }
                None => self.eof = true,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RowBatchSource for JsonLinesSource {
    type Row = Value;

    fn available_locally(&self) -> usize {
        self.buffer.len()
    }

    fn is_fully_fetched(&self) -> bool {
        self.eof && self.pending.is_empty()
    }

    fn take_one(&mut self) -> Option<Value> {
        self.buffer.pop_front()
    }

    async fn fetch_next_page(&mut self) -> std::result::Result<(), FetchError> {
        if self.is_fully_fetched() {
            return Ok(());
        }

        self.read_page_lines().await?;

        let mut page = Vec::with_capacity(self.pending.len());
        for (line, raw) in &self.pending {
            let row = serde_json::from_str(raw).map_err(|e| FetchError::Decode {
                line: *line,
                message: e.to_string(),
            })?;
            page.push(row);
        }

        self.pending.clear();
        debug!(
            "Read page of {} rows from {} (line {})",
            page.len(),
            self.path.display(),
            self.line_no
        );
        self.buffer.extend(page);
        Ok(())
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        self.columns.clone()
    }
}

/// Derive column metadata from the keys of an object row.
fn infer_columns(row: &Value) -> Vec<ColumnSpec> {
    match row {
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| ColumnSpec::new(name.as_str(), json_type_name(value)))
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "bigint",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
