//! Paged result cursors for wide-column database clients
//!
//! A query result that spans several server round-trips is exposed as a
//! demand-driven cursor: callers ask for one row, a bounded number of
//! rows, or everything, and further pages are fetched only when the
//! buffered rows cannot satisfy the request.
//!
//! # Modules
//!
//! - `cli`: Command-line interface of the replay tool
//! - `config`: Configuration management
//! - `coordinator`: Fetch coordinator and row streams
//! - `error`: Error types and handling
//! - `source`: Row source trait and the bundled sources
//!
//! # Example
//!
//! ```no_run
//! use cql_pager::{Config, FetchCoordinator};
//! use cql_pager::source::JsonLinesSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = JsonLinesSource::open("rows.jsonl", 50).await?;
//!     let cursor = FetchCoordinator::spawn(
//!         source,
//!         &tokio::runtime::Handle::current(),
//!         &config.cursor,
//!     );
//!
//!     while let Some(row) = cursor.one().await? {
//!         println!("{row}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{CursorStatus, FetchCoordinator};
pub use error::{PagerError, Result};
pub use source::{ColumnSpec, RowBatchSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
