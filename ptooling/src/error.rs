//! Function registration and execution errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotFound,
    DuplicateName,
    /// Argument text that is not valid JSON.
    MalformedArguments,
    InvalidArguments,
    Execution,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub function_name: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            function_name: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ToolErrorKind::DuplicateName,
            format!("function '{name}' is already registered"),
        )
        .with_function_name(name)
    }

    pub fn malformed_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::MalformedArguments, message)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Other, message)
    }

    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::MalformedArguments
                | ToolErrorKind::InvalidArguments
                | ToolErrorKind::NotFound
                | ToolErrorKind::DuplicateName
        )
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.function_name {
            Some(name) => write!(f, "{:?} [function={}]: {}", self.kind, name, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {}
