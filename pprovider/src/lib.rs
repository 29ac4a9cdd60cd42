//! Message model, completion transport and the single-flight streaming request manager.

mod error;
mod hooks;
mod manager;
mod message;
mod model;
mod secret;
mod stream;
mod transport;

pub mod adapters;
pub mod prelude;

pub use error::{ProviderError, ProviderErrorKind};
pub use hooks::{NoopRequestHooks, RequestHooks};
pub use manager::{RequestManager, RequestOutcome, RequestPhase};
pub use message::{
    AssistantBody, AssistantMessage, FunctionCall, FunctionMessage, Message, Role, SystemMessage,
    UserMessage, WireMessage,
};
pub use model::{ChatRequest, FunctionDefinition};
pub use secret::SecretString;
pub use stream::{
    ChunkChoice, ChunkDelta, ChunkStream, CompletionChunk, FinishReason, FunctionCallDelta,
    VecChunkStream,
};
pub use transport::{CompletionTransport, ProviderFuture};

#[cfg(feature = "provider-openai")]
pub use adapters::openai::{BackendAuth, OpenAiHttpTransport};
