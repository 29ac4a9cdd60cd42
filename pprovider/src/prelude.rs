//! Common `pprovider` imports for downstream crates.

pub use crate::{
    AssistantMessage, ChatRequest, ChunkStream, CompletionChunk, CompletionTransport,
    FinishReason, FunctionCall, FunctionDefinition, FunctionMessage, Message, NoopRequestHooks,
    ProviderError, ProviderErrorKind, ProviderFuture, RequestHooks, RequestManager,
    RequestOutcome, RequestPhase, Role, SystemMessage, UserMessage, VecChunkStream, WireMessage,
};
#[cfg(feature = "provider-openai")]
pub use crate::{BackendAuth, OpenAiHttpTransport};
pub use pcommon::{BoxFuture, MessageId, MetadataMap};
