//! Error handling module for cursor operations.
//!
//! This module provides the error types shared by row sources, the fetch
//! coordinator and the configuration layer:
//! - Fetch failures reported by a row source, passed to callers unchanged
//! - Request errors (invalid amounts, cancellation, stopped worker)
//! - Configuration errors
//!
//! # Example
//!
//! ```rust
//! use cql_pager::error::{FetchError, PagerError, Result};
//!
//! fn fetch_page() -> Result<()> {
//!     Err(FetchError::Transport("connection reset".to_string()).into())
//! }
//!
//! let err = fetch_page().unwrap_err();
//! assert!(err.is_fetch_failure());
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, FetchError, PagerError, RequestError, Result};
