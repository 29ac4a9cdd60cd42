//! Unified facade over the palaver workspace crates.
//!
//! This crate is designed to be the single dependency for most hosts. It re-exports the
//! message model, the function registry and the chat service, parses settings documents and
//! wires the HTTP transport together with tracing hooks.
//!
//! ```rust
//! use palaver::{ChatService, FunctionRegistry, pv_function};
//!
//! let mut functions = FunctionRegistry::new();
//! functions
//!     .register_sync_fn(
//!         pv_function!("getTime", "Current wall clock time"),
//!         |_args, _ctx| Ok("12:00".to_string()),
//!     )
//!     .expect("unique name");
//!
//! assert_eq!(functions.definitions()[0].name, "getTime");
//! # let _ = std::any::type_name::<ChatService>();
//! ```

mod macros;

pub mod prelude;
#[cfg(feature = "provider-openai")]
pub mod runtime;
pub mod settings;
pub mod util;

pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    ChatConfig, ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatObserver, ChatPolicy,
    ChatService, ChatServiceBuilder, ConversationHistory, FanoutObserver, NoopChatObserver,
    SystemPromptSynthesizer, UserPrompt, channel_observer,
};
pub use pcommon::{BoxFuture, MessageId, MetadataMap, Registry, SamplingOptions};
pub use pobserve::{
    MetricsObservabilityHooks, SafeChatObserver, SafeRequestHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use pprovider::{
    AssistantBody, AssistantMessage, ChatRequest, ChunkStream, CompletionChunk,
    CompletionTransport, FinishReason, FunctionCall, FunctionDefinition, FunctionMessage, Message,
    NoopRequestHooks, ProviderError, ProviderErrorKind, ProviderFuture, RequestHooks,
    RequestManager, RequestOutcome, RequestPhase, Role, SecretString, SystemMessage, UserMessage,
    VecChunkStream, WireMessage,
};
#[cfg(feature = "provider-openai")]
pub use pprovider::{BackendAuth, OpenAiHttpTransport};
pub use ptooling::{
    DefaultToolRuntime, FunctionDescriptor, FunctionRegistry, FunctionTool,
    NoopToolRuntimeHooks, ParameterDescriptor, ParameterType, Tool, ToolError, ToolErrorKind,
    ToolExecutionContext, ToolExecutionResult, ToolFuture, ToolRuntime, ToolRuntimeHooks,
    optional_string, parse_arguments, parse_json_object, required_number, required_string,
};

#[cfg(feature = "provider-openai")]
pub use runtime::{Assistant, build_transport, traced_chat_service};
pub use settings::{BackendSettings, Settings, SettingsError, SettingsErrorKind};
pub use util::{assistant_message, code_prompt, system_message, user_message};
