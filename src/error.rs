// Error module: every failure a command can hit is one variant of `Error`.
// The dispatcher turns these into a printed message and exit status 1, so
// nothing in the library prints errors itself.

use thiserror::Error;

/// Every failure a CLI invocation can end with.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad local input (missing flag, out-of-range pagination, missing file).
    /// Raised before any network call.
    #[error("Error: {0}")]
    Validation(String),

    #[error("Not logged in. Use 'cbrain login' to login first.")]
    NotLoggedIn,

    #[error("Session expired. Please log in again using 'cbrain login'.")]
    SessionExpired,

    #[error("Already logged in. Use 'cbrain logout' to logout.")]
    AlreadyLoggedIn,

    /// Login was rejected or the server returned no token.
    #[error("Login failed: {0}")]
    Auth(String),

    /// A 404 reworded for the resource that was asked for.
    #[error("Error: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("Request failed: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    /// The server could not be reached at all.
    #[error("Cannot connect to CBRAIN server at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A body that should have been JSON was not.
    #[error("Failed: Invalid response from server ({0})")]
    Decode(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the dispatcher for logging and hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Http,
    Transport,
    Decode,
    Cancelled,
    Local,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotLoggedIn
            | Error::SessionExpired
            | Error::AlreadyLoggedIn
            | Error::Auth(_) => ErrorKind::Auth,
            Error::NotFound(_) | Error::Api { .. } => ErrorKind::Http,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::Local,
            Error::Io(e) if e.kind() == std::io::ErrorKind::Interrupted => ErrorKind::Cancelled,
            Error::Io(_) => ErrorKind::Local,
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Replace a generic 404 with a message naming the missing resource.
    pub fn or_not_found(self, message: impl FnOnce() -> String) -> Self {
        match self {
            Error::Api { status: 404, .. } => Error::NotFound(message()),
            other => other,
        }
    }

    /// Short follow-up line printed under the error, when there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Transport { .. } => {
                Some("Please check if the CBRAIN server is running and accessible.")
            }
            Error::Api { status: 401, .. } => Some("Invalid username or password"),
            Error::Api { status: 500, .. } => Some("Internal server error"),
            _ => None,
        }
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;
