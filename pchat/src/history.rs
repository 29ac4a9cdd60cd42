//! Ordered, editable conversation history and its bounded request rendering.

use std::sync::Arc;

use pcommon::MessageId;
use pprovider::{
    AssistantMessage, FunctionCall, FunctionMessage, Message, UserMessage, WireMessage,
};

use crate::{ChatError, ChatEvent, ChatObserver, NoopChatObserver, SystemPromptSynthesizer};

pub struct ConversationHistory {
    messages: Vec<Message>,
    window: usize,
    synthesizer: SystemPromptSynthesizer,
    observer: Arc<dyn ChatObserver>,
}

impl ConversationHistory {
    pub fn new(window: usize, synthesizer: SystemPromptSynthesizer) -> Self {
        Self::with_observer(window, synthesizer, Arc::new(NoopChatObserver))
    }

    pub fn with_observer(
        window: usize,
        synthesizer: SystemPromptSynthesizer,
        observer: Arc<dyn ChatObserver>,
    ) -> Self {
        Self {
            messages: Vec::new(),
            window,
            synthesizer,
            observer,
        }
    }

    pub fn append_user(
        &mut self,
        id: MessageId,
        text: impl Into<String>,
        code: Option<String>,
    ) {
        let mut message = UserMessage::new(id, text);
        message.code = code;
        self.append_user_message(message);
    }

    /// Stores a user turn and announces it as a pending request.
    pub fn append_user_message(&mut self, message: UserMessage) {
        self.observer.on_event(&ChatEvent::UserRequest(message.clone()));
        self.messages.push(Message::User(message));
    }

    pub fn annotate_user(&mut self, id: &MessageId, annotation: impl Into<String>) -> Result<(), ChatError> {
        let message = self.user_mut(id)?;
        message.annotate(annotation);
        Ok(())
    }

    /// Replaces the text of a stored user turn and drops every message after it.
    pub fn edit_user(&mut self, id: &MessageId, new_text: impl Into<String>) -> Result<(), ChatError> {
        let index = self.user_index(id)?;
        if let Message::User(message) = &mut self.messages[index] {
            message.content = new_text.into();
            message.annotations.clear();
        }

        self.messages.truncate(index + 1);
        if let Some(Message::User(message)) = self.messages.last() {
            self.observer.on_event(&ChatEvent::UserRequest(message.clone()));
        }

        Ok(())
    }

    pub fn append_assistant_text(&mut self, id: MessageId, content: impl Into<String>) {
        self.messages
            .push(Message::Assistant(AssistantMessage::text(id, content)));
    }

    pub fn append_assistant_call(&mut self, id: MessageId, call: FunctionCall) {
        self.messages
            .push(Message::Assistant(AssistantMessage::function_call(id, call)));
    }

    pub fn append_function_result(
        &mut self,
        id: MessageId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.messages
            .push(Message::Function(FunctionMessage::new(id, name, content)));
    }

    pub fn remove_by_id(&mut self, id: &MessageId) -> Result<Message, ChatError> {
        let index = self
            .messages
            .iter()
            .position(|message| message.id() == id)
            .ok_or_else(|| ChatError::invalid_id(id))?;

        Ok(self.messages.remove(index))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.observer.on_event(&ChatEvent::HistoryCleared);
    }

    /// Synthesized prompt followed by the most recent `window` messages.
    pub fn render(&self) -> Vec<WireMessage> {
        let start = self.messages.len().saturating_sub(self.window);
        std::iter::once(self.synthesizer.produce().to_wire())
            .chain(self.messages[start..].iter().map(Message::to_wire))
            .collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id() == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn set_window(&mut self, window: usize) {
        self.window = window;
    }

    pub fn synthesizer(&self) -> &SystemPromptSynthesizer {
        &self.synthesizer
    }

    pub fn synthesizer_mut(&mut self) -> &mut SystemPromptSynthesizer {
        &mut self.synthesizer
    }

    fn user_index(&self, id: &MessageId) -> Result<usize, ChatError> {
        self.messages
            .iter()
            .position(|message| matches!(message, Message::User(user) if &user.id == id))
            .ok_or_else(|| ChatError::invalid_id(id))
    }

    fn user_mut(&mut self, id: &MessageId) -> Result<&mut UserMessage, ChatError> {
        let index = self.user_index(id)?;
        match &mut self.messages[index] {
            Message::User(message) => Ok(message),
            _ => Err(ChatError::invalid_id(id)),
        }
    }
}

impl std::fmt::Debug for ConversationHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationHistory")
            .field("messages", &self.messages)
            .field("window", &self.window)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}
