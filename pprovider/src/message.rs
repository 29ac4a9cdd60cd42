//! Conversation message model and its wire form.
//!
//! ```rust
//! use pcommon::MessageId;
//! use pprovider::{Message, Role, UserMessage};
//!
//! let message = Message::User(
//!     UserMessage::new(MessageId::new("u1"), "Explain this").with_code("fn main() {}"),
//! );
//!
//! let wire = message.to_wire();
//! assert_eq!(message.role(), Role::User);
//! assert_eq!(wire.role, "user");
//! assert_eq!(wire.content.as_deref(), Some("Explain this\n\n```\nfn main() {}\n```"));
//! ```

use pcommon::MessageId;
use serde::{Deserialize, Serialize};

const ANNOTATION_PREFIX: &str = "#SYSTEM:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

/// A function invocation requested by the model; `arguments` is raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessage {
    pub id: MessageId,
    pub content: String,
}

impl SystemMessage {
    pub fn new(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}

/// A user turn.
///
/// Annotations are system-origin hints attached to this single turn (selection context and
/// the like). They are folded into the wire content rather than stored as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub id: MessageId,
    pub content: String,
    pub annotations: Vec<String>,
    pub code: Option<String>,
}

impl UserMessage {
    pub fn new(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            annotations: Vec::new(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn annotate(&mut self, annotation: impl Into<String>) {
        self.annotations.push(annotation.into());
    }

    pub fn wire_content(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if !self.annotations.is_empty() {
            let mut header = self
                .annotations
                .iter()
                .map(|annotation| format!("{ANNOTATION_PREFIX} {annotation}"))
                .collect::<Vec<_>>()
                .join("\n");
            header.push('\n');
            header.push_str(ANNOTATION_PREFIX);
            header.push_str(" User query below");
            parts.push(header);
        }

        parts.push(self.content.clone());
        if let Some(code) = &self.code {
            parts.push(format!("```\n{code}\n```"));
        }

        parts.join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantBody {
    Text(String),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessage {
    pub id: MessageId,
    pub body: AssistantBody,
}

impl AssistantMessage {
    pub fn text(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            body: AssistantBody::Text(content.into()),
        }
    }

    pub fn function_call(id: MessageId, call: FunctionCall) -> Self {
        Self {
            id,
            body: AssistantBody::FunctionCall(call),
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.body {
            AssistantBody::Text(content) => Some(content),
            AssistantBody::FunctionCall(_) => None,
        }
    }

    pub fn call(&self) -> Option<&FunctionCall> {
        match &self.body {
            AssistantBody::Text(_) => None,
            AssistantBody::FunctionCall(call) => Some(call),
        }
    }
}

/// Result text produced by a host function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMessage {
    pub id: MessageId,
    pub name: String,
    pub content: String,
}

impl FunctionMessage {
    pub fn new(id: MessageId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    Function(FunctionMessage),
}

impl Message {
    pub fn id(&self) -> &MessageId {
        match self {
            Self::System(message) => &message.id,
            Self::User(message) => &message.id,
            Self::Assistant(message) => &message.id,
            Self::Function(message) => &message.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Function(_) => Role::Function,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Self::User(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(message) => Some(message),
            _ => None,
        }
    }

    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::System(message) => WireMessage::new(Role::System, message.content.clone()),
            Self::User(message) => WireMessage::new(Role::User, message.wire_content()),
            Self::Assistant(message) => match &message.body {
                AssistantBody::Text(content) => WireMessage::new(Role::Assistant, content.clone()),
                AssistantBody::FunctionCall(call) => WireMessage {
                    role: Role::Assistant.as_str().to_string(),
                    content: None,
                    name: None,
                    function_call: Some(call.clone()),
                },
            },
            Self::Function(message) => WireMessage {
                role: Role::Function.as_str().to_string(),
                content: Some(message.content.clone()),
                name: Some(message.name.clone()),
                function_call: None,
            },
        }
    }
}

impl From<SystemMessage> for Message {
    fn from(value: SystemMessage) -> Self {
        Self::System(value)
    }
}

impl From<UserMessage> for Message {
    fn from(value: UserMessage) -> Self {
        Self::User(value)
    }
}

impl From<AssistantMessage> for Message {
    fn from(value: AssistantMessage) -> Self {
        Self::Assistant(value)
    }
}

impl From<FunctionMessage> for Message {
    fn from(value: FunctionMessage) -> Self {
        Self::Function(value)
    }
}

/// Chat-completions message payload.
///
/// `content` is always serialized; an assistant function-call turn sends `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }
}
