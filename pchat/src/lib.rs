//! Conversation history, system prompt synthesis and turn orchestration.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::{ChatConfig, ChatService};
//! use pprovider::{
//!     ChatRequest, ChunkStream, CompletionChunk, CompletionTransport, FinishReason, Message,
//!     ProviderError, ProviderFuture, VecChunkStream,
//! };
//!
//! #[derive(Debug)]
//! struct Echo;
//!
//! impl CompletionTransport for Echo {
//!     fn stream<'a>(
//!         &'a self,
//!         _request: ChatRequest,
//!     ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>> {
//!         Box::pin(async move {
//!             let chunks = VecChunkStream::new(vec![
//!                 Ok(CompletionChunk::content("Hi there")),
//!                 Ok(CompletionChunk::finish(FinishReason::Stop)),
//!             ]);
//!             Ok(Box::pin(chunks) as ChunkStream<'a>)
//!         })
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let service = ChatService::builder(Arc::new(Echo))
//!     .config(ChatConfig::new("gpt-4").with_system_prompt("Be brief."))
//!     .build()
//!     .expect("valid config");
//!
//! assert!(service.send_user_prompt("Hello").await);
//!
//! let history = service.history();
//! assert_eq!(history.len(), 2);
//! assert!(matches!(&history[1], Message::Assistant(reply) if reply.content() == Some("Hi there")));
//! # });
//! ```

mod config;
mod error;
mod history;
mod observer;
mod prompt;
mod service;
mod types;

pub mod prelude {
    pub use crate::{
        ChatConfig, ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatObserver,
        ChatPolicy, ChatService, ChatServiceBuilder, ConversationHistory, SystemPromptSynthesizer,
        UserPrompt, channel_observer,
    };
    pub use pcommon::MessageId;
    pub use ptooling::{
        FunctionDescriptor, FunctionRegistry, ParameterDescriptor, Tool, ToolError,
        ToolErrorKind, ToolExecutionContext,
    };
}

pub use config::{ChatConfig, DEFAULT_ASSISTANT_NAME, DEFAULT_MAX_HISTORY, DEFAULT_MODEL};
pub use error::{ChatError, ChatErrorKind};
pub use history::ConversationHistory;
pub use observer::{
    ChannelChatObserver, ChatObserver, FanoutObserver, NoopChatObserver, channel_observer,
};
pub use prompt::{SYSTEM_PROMPT_ID, SystemPromptSynthesizer};
pub use service::{ChatPolicy, ChatService, ChatServiceBuilder, DEFAULT_MAX_CHAINED_TURNS};
pub use types::{ChatEvent, ChatEventStream, UserPrompt};
