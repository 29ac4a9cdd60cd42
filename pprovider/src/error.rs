//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::{ProviderError, ProviderErrorKind};
//!
//! let auth = ProviderError::authentication("bad key");
//! assert!(!auth.retryable);
//!
//! let transport = ProviderError::transport("connection reset").with_cause("os error 104");
//! assert!(transport.retryable);
//! assert_eq!(transport.cause.as_deref(), Some("os error 104"));
//! assert_eq!(ProviderError::aborted().kind, ProviderErrorKind::Aborted);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    AlreadyInProgress,
    ProtocolViolation,
    Aborted,
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Rendered underlying failure, kept for diagnostics.
    pub cause: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            cause: None,
        }
    }

    pub fn already_in_progress() -> Self {
        Self::new(
            ProviderErrorKind::AlreadyInProgress,
            "another request is already in progress",
            true,
        )
    }

    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ProtocolViolation, message, false)
    }

    pub fn aborted() -> Self {
        Self::new(ProviderErrorKind::Aborted, "request aborted", false)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    pub fn with_cause(mut self, cause: impl Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ProviderErrorKind::Aborted
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{:?}: {} ({})", self.kind, self.message, cause),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}
