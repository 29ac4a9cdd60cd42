//! Small convenience constructors for common types.

use crate::{
    AssistantMessage, Message, MessageId, SystemMessage, UserMessage, UserPrompt,
};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::System(SystemMessage::new(MessageId::generate(), content))
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::User(UserMessage::new(MessageId::generate(), content))
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::Assistant(AssistantMessage::text(MessageId::generate(), content))
}

/// Prompt with a code block attached, the shape editor selections usually take.
pub fn code_prompt(text: impl Into<String>, code: impl Into<String>) -> UserPrompt {
    UserPrompt::new(text).with_code(code)
}
