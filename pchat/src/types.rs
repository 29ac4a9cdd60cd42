//! Prompt input and chat event types.

use std::pin::Pin;

use futures_core::Stream;
use pcommon::MessageId;
use pprovider::UserMessage;

use crate::ChatErrorKind;

/// One user submission: the query text plus optional per-turn hints and attached code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPrompt {
    pub text: String,
    pub annotations: Vec<String>,
    pub code: Option<String>,
}

impl UserPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Vec::new(),
            code: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub(crate) fn into_message(self, id: MessageId) -> UserMessage {
        UserMessage {
            id,
            content: self.text,
            annotations: self.annotations,
            code: self.code,
        }
    }
}

impl From<&str> for UserPrompt {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserPrompt {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A user turn was appended or edited and awaits a model answer.
    UserRequest(UserMessage),
    UserPromptEcho {
        id: MessageId,
        text: String,
    },
    ContentDelta {
        message_id: MessageId,
        delta: String,
    },
    FunctionCallStarted {
        message_id: MessageId,
        name: String,
        status: Option<String>,
    },
    FunctionResult {
        message_id: MessageId,
        name: String,
    },
    TurnFinished {
        message_id: MessageId,
    },
    TurnError {
        kind: ChatErrorKind,
        message: String,
        /// Underlying failure, when the error carried one.
        cause: Option<String>,
    },
    HistoryCleared,
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRequest(_) => "user_request",
            Self::UserPromptEcho { .. } => "user_prompt_echo",
            Self::ContentDelta { .. } => "content_delta",
            Self::FunctionCallStarted { .. } => "function_call_started",
            Self::FunctionResult { .. } => "function_result",
            Self::TurnFinished { .. } => "turn_finished",
            Self::TurnError { .. } => "turn_error",
            Self::HistoryCleared => "history_cleared",
        }
    }
}

pub type ChatEventStream<'a> = Pin<Box<dyn Stream<Item = ChatEvent> + Send + 'a>>;
