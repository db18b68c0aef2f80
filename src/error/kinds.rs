use std::{fmt, io};

/// Crate-wide `Result` type using [`PagerError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, PagerError>;

/// Top-level error type for cursor operations.
///
/// Every failure a retrieval call can report travels through this type,
/// on the same channel as successful results.
#[derive(Debug)]
pub enum PagerError {
    /// A page fetch failed. Carries the source's error unchanged.
    Fetch(FetchError),

    /// The retrieval request itself could not be served.
    Request(RequestError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors outside of page fetching.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors reported by a row source while fetching a page.
///
/// A failed fetch never appends rows to the local buffer.
#[derive(Debug)]
pub enum FetchError {
    /// Network or transport-level failure.
    Transport(String),

    /// The server answered with an error.
    Server { code: i32, message: String },

    /// Reading the backing file failed.
    Io(io::Error),

    /// A row in the page could not be decoded.
    Decode { line: usize, message: String },
}

/// Errors in how a retrieval request was issued or served.
#[derive(Debug)]
pub enum RequestError {
    /// `several` was called with an amount it cannot serve.
    InvalidAmount(usize),

    /// The request was cancelled before its result was delivered.
    Cancelled,

    /// The cursor worker is no longer running.
    CoordinatorClosed,

    /// The worker answered with a reply of the wrong shape.
    UnexpectedReply(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl PagerError {
    /// True when the error came from a failed page fetch.
    ///
    /// Such failures leave the cursor usable, so the caller may retry the
    /// whole retrieval call.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, PagerError::Fetch(_))
    }

    /// True when the request was cancelled through its token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PagerError::Request(RequestError::Cancelled))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for PagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagerError::Fetch(e) => write!(f, "Fetch failed: {e}"),
            PagerError::Request(e) => write!(f, "Request error: {e}"),
            PagerError::Config(e) => write!(f, "Configuration error: {e}"),
            PagerError::Io(e) => write!(f, "I/O error: {e}"),
            PagerError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Transport error: {msg}"),
            FetchError::Server { code, message } => {
                write!(f, "Server error {code:#06x}: {message}")
            }
            FetchError::Io(e) => write!(f, "Read error: {e}"),
            FetchError::Decode { line, message } => {
                write!(f, "Malformed row at line {line}: {message}")
            }
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidAmount(n) => {
                write!(f, "Invalid row amount {n}: must be at least 1")
            }
            RequestError::Cancelled => write!(f, "Request cancelled"),
            RequestError::CoordinatorClosed => write!(f, "Cursor worker has stopped"),
            RequestError::UnexpectedReply(msg) => write!(f, "Unexpected reply: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PagerError::Fetch(e) => Some(e),
            PagerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for RequestError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to PagerError ========================= */

impl From<io::Error> for PagerError {
    fn from(err: io::Error) -> Self {
        PagerError::Io(err)
    }
}

impl From<FetchError> for PagerError {
    fn from(err: FetchError) -> Self {
        PagerError::Fetch(err)
    }
}

impl From<RequestError> for PagerError {
    fn from(err: RequestError) -> Self {
        PagerError::Request(err)
    }
}

impl From<ConfigError> for PagerError {
    fn from(err: ConfigError) -> Self {
        PagerError::Config(err)
    }
}

impl From<String> for PagerError {
    fn from(msg: String) -> Self {
        PagerError::Generic(msg)
    }
}

impl From<&str> for PagerError {
    fn from(msg: &str) -> Self {
        PagerError::Generic(msg.to_owned())
    }
}

impl From<io::Error> for FetchError {
    fn from(err: io::Error) -> Self {
        FetchError::Io(err)
    }
}
