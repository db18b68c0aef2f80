//! Replay of a recorded result through a fetch coordinator
//!
//! Opens a JSON Lines file as a paged result and runs a list of cursor
//! operations against it, printing delivered rows one JSON document per
//! line.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use futures::TryStreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::Config;
use crate::coordinator::FetchCoordinator;
use crate::error::{PagerError, Result};
use crate::source::JsonLinesSource;

/// One cursor operation of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOp {
    /// `one`
    One,
    /// `several:N`
    Several(usize),
    /// `all`
    All,
    /// `fetch`: fetch one more page without taking rows
    Fetch,
    /// `status`: print the cursor status
    Status,
    /// `stream`: stream the remaining rows batch by batch
    Stream,
}

impl FromStr for ReplayOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one" => Ok(ReplayOp::One),
            "all" => Ok(ReplayOp::All),
            "fetch" => Ok(ReplayOp::Fetch),
            "status" => Ok(ReplayOp::Status),
            "stream" => Ok(ReplayOp::Stream),
            other => match other.strip_prefix("several:") {
                Some(n) => match n.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(ReplayOp::Several(n)),
                    _ => Err(format!("invalid row amount in '{s}'")),
                },
                None => Err(format!(
                    "unknown operation '{s}' (expected one, several:N, all, fetch, status, stream)"
                )),
            },
        }
    }
}

impl fmt::Display for ReplayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayOp::One => write!(f, "one"),
            ReplayOp::Several(n) => write!(f, "several:{n}"),
            ReplayOp::All => write!(f, "all"),
            ReplayOp::Fetch => write!(f, "fetch"),
            ReplayOp::Status => write!(f, "status"),
            ReplayOp::Stream => write!(f, "stream"),
        }
    }
}

/// Totals of a finished replay
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub operations: usize,
    pub rows_delivered: usize,
}

/// Run `ops` against the result stored in `path`.
///
/// # Arguments
/// * `path` - JSON Lines file holding the result rows
/// * `ops` - Operations to run, in order
/// * `config` - Page size, queue depth and stream batch size
/// * `runtime` - Runtime the cursor worker runs on
/// * `out` - Destination of delivered rows and status lines
pub async fn replay<W: Write>(
    path: &Path,
    ops: &[ReplayOp],
    config: &Config,
    runtime: &Handle,
    out: &mut W,
) -> Result<ReplaySummary> {
    let source = JsonLinesSource::open(path, config.cursor.page_size as usize).await?;
    let cursor = FetchCoordinator::spawn(source, runtime, &config.cursor);
    let mut summary = ReplaySummary::default();

    for op in ops {
        debug!("Running {}", op);
        let delivered = match op {
            ReplayOp::One => match cursor.one().await? {
                Some(row) => write_rows(out, &[row])?,
                None => {
                    writeln!(out, "-- exhausted")?;
                    0
                }
            },
            ReplayOp::Several(n) => write_rows(out, &cursor.several(*n).await?)?,
            ReplayOp::All => write_rows(out, &cursor.all().await?)?,
            ReplayOp::Fetch => {
                cursor.fetch_more().await?;
                0
            }
            ReplayOp::Status => {
                writeln!(out, "{}", to_json(&cursor.status())?)?;
                0
            }
            ReplayOp::Stream => {
                let mut rows = cursor.rows();
                let mut count = 0;
                while let Some(row) = rows.try_next().await? {
                    count += write_rows(out, &[row])?;
                }
                count
            }
        };
        summary.operations += 1;
        summary.rows_delivered += delivered;
    }

    out.flush()?;
    info!(
        "Replayed {} operations, {} rows delivered",
        summary.operations, summary.rows_delivered
    );
    Ok(summary)
}

fn write_rows<W: Write>(out: &mut W, rows: &[Value]) -> Result<usize> {
    for row in rows {
        writeln!(out, "{}", to_json(row)?)?;
    }
    Ok(rows.len())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| PagerError::Generic(format!("Failed to encode JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::fs;
    use uuid::Uuid;

    async fn write_temp(rows: usize) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cql-pager-replay-{}.jsonl", Uuid::new_v4()));
        let content: String = (0..rows).map(|i| format!("{{\"id\":{i}}}\n")).collect();
        fs::write(&path, content).await.unwrap();
        path
    }

    fn config(page_size: u32) -> Config {
        let mut config = Config::default();
        config.cursor.page_size = page_size;
        config.cursor.stream_batch = 2;
        config
    }

    #[test]
    fn test_parse_ops() {
        assert_eq!("one".parse::<ReplayOp>().unwrap(), ReplayOp::One);
        assert_eq!("several:4".parse::<ReplayOp>().unwrap(), ReplayOp::Several(4));
        assert_eq!("ALL".parse::<ReplayOp>().unwrap(), ReplayOp::All);
        assert!("several:0".parse::<ReplayOp>().is_err());
        assert!("several:x".parse::<ReplayOp>().is_err());
        assert!("drop".parse::<ReplayOp>().is_err());
    }

    #[test]
    fn test_op_display_parses_back() {
        for op in [ReplayOp::Several(12), ReplayOp::Stream, ReplayOp::Fetch] {
            assert_eq!(op.to_string().parse::<ReplayOp>().unwrap(), op);
        }
    }

    #[tokio::test]
    async fn test_replay_several_then_one() {
        let path = write_temp(5).await;
        let mut out = Vec::new();

        let ops = [
            ReplayOp::Several(4),
            ReplayOp::Several(4),
            ReplayOp::One,
            ReplayOp::Status,
        ];
        let summary = replay(&path, &ops, &config(3), &Handle::current(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..5], &[
            "{\"id\":0}",
            "{\"id\":1}",
            "{\"id\":2}",
            "{\"id\":3}",
            "{\"id\":4}",
        ]);
        assert_eq!(lines[5], "-- exhausted");
        assert!(lines[6].contains("\"exhausted\":true"));
        assert_eq!(summary.rows_delivered, 5);
        assert_eq!(summary.operations, 4);

        fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_replay_stream() {
        let path = write_temp(7).await;
        let mut out = Vec::new();

        let summary = replay(&path, &[ReplayOp::Stream], &config(3), &Handle::current(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary.rows_delivered, 7);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 7);

        fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_replay_reports_decode_failure() {
        let path = std::env::temp_dir().join(format!("cql-pager-replay-{}.jsonl", Uuid::new_v4()));
        fs::write(&path, "{\"id\":1}\n{broken\n").await.unwrap();
        let mut out = Vec::new();

        let err = replay(&path, &[ReplayOp::All], &config(1), &Handle::current(), &mut out)
            .await
            .unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(out.is_empty());

        fs::remove_file(&path).await.ok();
    }
}
