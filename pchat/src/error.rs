//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{ProviderError, ProviderErrorKind};
use ptooling::{ToolError, ToolErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    AlreadyInProgress,
    ProtocolViolation,
    InvalidId,
    DuplicateKey,
    ArgumentParseFailure,
    TransportFailure,
    Aborted,
    CallLimitExceeded,
    InvalidRequest,
    Tooling,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// Rendered underlying failure, kept for diagnostics.
    pub cause: Option<String>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn already_in_progress() -> Self {
        Self::new(
            ChatErrorKind::AlreadyInProgress,
            "a turn is already in progress",
        )
    }

    pub fn invalid_id(id: impl Display) -> Self {
        Self::new(
            ChatErrorKind::InvalidId,
            format!("no matching message with id '{id}'"),
        )
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::DuplicateKey, message)
    }

    pub fn aborted() -> Self {
        Self::new(ChatErrorKind::Aborted, "turn aborted")
    }

    pub fn call_limit_exceeded(limit: usize) -> Self {
        Self::new(
            ChatErrorKind::CallLimitExceeded,
            format!("function calls chained more than {limit} times"),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn with_cause(mut self, cause: impl Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ChatErrorKind::Aborted
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{:?}: {} ({})", self.kind, self.message, cause),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let kind = match value.kind {
            ProviderErrorKind::AlreadyInProgress => ChatErrorKind::AlreadyInProgress,
            ProviderErrorKind::ProtocolViolation => ChatErrorKind::ProtocolViolation,
            ProviderErrorKind::Aborted => ChatErrorKind::Aborted,
            ProviderErrorKind::InvalidRequest => ChatErrorKind::InvalidRequest,
            ProviderErrorKind::Transport | ProviderErrorKind::Timeout => {
                ChatErrorKind::TransportFailure
            }
            ProviderErrorKind::Authentication
            | ProviderErrorKind::RateLimited
            | ProviderErrorKind::Unavailable
            | ProviderErrorKind::Other => ChatErrorKind::Provider,
        };

        Self {
            kind,
            message: value.message,
            cause: value.cause,
        }
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        let kind = match value.kind {
            ToolErrorKind::MalformedArguments => ChatErrorKind::ArgumentParseFailure,
            ToolErrorKind::DuplicateName => ChatErrorKind::DuplicateKey,
            _ => ChatErrorKind::Tooling,
        };

        Self::new(kind, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_onto_turn_taxonomy() {
        let transport: ChatError = ProviderError::transport("reset").with_cause("eof").into();
        assert_eq!(transport.kind, ChatErrorKind::TransportFailure);
        assert_eq!(transport.cause.as_deref(), Some("eof"));

        let aborted: ChatError = ProviderError::aborted().into();
        assert!(aborted.is_aborted());

        let auth: ChatError = ProviderError::authentication("bad key").into();
        assert_eq!(auth.kind, ChatErrorKind::Provider);
    }

    #[test]
    fn tool_errors_map_onto_turn_taxonomy() {
        let malformed: ChatError = ToolError::malformed_arguments("bad json").into();
        assert_eq!(malformed.kind, ChatErrorKind::ArgumentParseFailure);

        let duplicate: ChatError = ToolError::duplicate_name("getTime").into();
        assert_eq!(duplicate.kind, ChatErrorKind::DuplicateKey);

        let failed: ChatError = ToolError::execution("boom").into();
        assert_eq!(failed.kind, ChatErrorKind::Tooling);
    }
}
