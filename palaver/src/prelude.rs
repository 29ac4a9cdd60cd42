//! Common imports for most palaver hosts.

#[cfg(feature = "provider-openai")]
pub use crate::{Assistant, BackendAuth, build_transport, traced_chat_service};
pub use crate::{BackendSettings, Settings, SettingsError};
pub use crate::{
    ChatConfig, ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatObserver, ChatPolicy,
    ChatService, ChatServiceBuilder, CompletionTransport, FunctionCall, FunctionDescriptor,
    FunctionRegistry, Message, MessageId, ParameterDescriptor, ParameterType, ProviderError,
    Role, Tool, ToolError, ToolExecutionContext, UserPrompt, channel_observer,
};
pub use crate::{assistant_message, code_prompt, system_message, user_message};
pub use crate::{pv_function, pv_param};
