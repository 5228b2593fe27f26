//! # API Error Types
//!
//! Uniform error handling for bigdataops-client library and CLI operations.
//! Every rejected operation carries an [`ErrorKind`] so call sites can branch
//! on classification instead of message text.

use thiserror::Error;

/// Client operation result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure classification for API operations
///
/// The kinds partition every possible rejection: envelope-level business
/// failures, the four authoritative HTTP statuses the backend uses, transport
/// failures where no response arrived, and malformed local request setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP success but envelope `code` signalled failure
    Business,
    /// HTTP 401; the session has been invalidated as a side effect
    Auth,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 5xx
    Server,
    /// No response: DNS failure, connection refused, or deadline exceeded
    Transport,
    /// Malformed local request setup (bad URL, unserializable body)
    Config,
}

impl ErrorKind {
    /// Stable string form used in logs and CLI output
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Business => "business",
            ErrorKind::Auth => "auth",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Server => "server",
            ErrorKind::Transport => "transport",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error for every rejected API operation
///
/// Carries the failure [`kind`](ErrorKind), a human-readable message (the
/// backend-provided `msg` where one exists), and the original HTTP status when
/// a response was received at all.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ApiError {
    /// Failure classification; callers branch on this, never on `message`
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
    /// Original HTTP status, absent for transport and config failures
    pub status: Option<u16>,
}

impl ApiError {
    /// Create an error of the given kind with no HTTP status attached
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attach the originating HTTP status
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Create a business-level failure (envelope code mismatch)
    pub fn business(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Business, message)
    }

    /// Create an authentication failure (session invalidated)
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    /// Create an authorization-denied failure
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not-found failure
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a server-fault failure
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    /// Create a transport failure (no usable response)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a local configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// True for 401 rejections that invalidated the session
    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    /// True when no response was received (network failure or timeout)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    /// Check if the failure is worth retrying at a higher layer
    ///
    /// Transport failures and server faults may clear up on their own;
    /// everything else is authoritative and retrying would not change the
    /// outcome.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self.kind {
            ErrorKind::Transport | ErrorKind::Server => true,
            ErrorKind::Business
            | ErrorKind::Auth
            | ErrorKind::Forbidden
            | ErrorKind::NotFound
            | ErrorKind::Config => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    /// Classify a send-level failure
    ///
    /// Deadline expiry and hard connection failures are distinguished in the
    /// message (and at the warn-log site) but share the `Transport` kind, so
    /// callers treat them identically.
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request deadline exceeded: {}", e)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            format!("network request failed: {}", e)
        };

        Self {
            kind: ErrorKind::Transport,
            message,
            status: e.status().map(|s| s.as_u16()),
        }
    }
}
