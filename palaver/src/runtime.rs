//! Runtime wiring: HTTP transport, tracing hooks and the chat service behind one handle.

use std::sync::Arc;

use pchat::{ChatError, ChatObserver, ChatService, ChatServiceBuilder};
use pobserve::{SafeChatObserver, SafeRequestHooks, SafeToolHooks, TracingObservabilityHooks};
use pprovider::{CompletionTransport, OpenAiHttpTransport, ProviderError};
use ptooling::DefaultToolRuntime;
use reqwest::Client;

use crate::{BackendSettings, Settings};

/// Builds the HTTP transport for `backend`.
pub fn build_transport(
    backend: &BackendSettings,
) -> Result<Arc<dyn CompletionTransport>, ProviderError> {
    let auth = backend.to_auth();
    auth.validate()?;

    let client = Client::builder()
        .user_agent(concat!("palaver/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;
    Ok(Arc::new(OpenAiHttpTransport::new(client, auth)))
}

/// Chat service builder with tracing wired into the request, function and chat phases.
pub fn traced_chat_service(transport: Arc<dyn CompletionTransport>) -> ChatServiceBuilder {
    let tool_runtime =
        DefaultToolRuntime::new().with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)));

    ChatService::builder(transport)
        .request_hooks(Arc::new(SafeRequestHooks::new(TracingObservabilityHooks)))
        .tool_runtime(Arc::new(tool_runtime))
        .observer(Arc::new(SafeChatObserver::new(TracingObservabilityHooks)))
}

/// A conversation bound to the backend and configuration of a [`Settings`] document.
#[derive(Debug)]
pub struct Assistant {
    service: ChatService,
}

impl Assistant {
    pub fn from_settings(settings: Settings) -> Result<Self, ChatError> {
        Self::from_settings_with_observers(settings, Vec::new())
    }

    /// Like [`Assistant::from_settings`], with extra observers receiving every chat event.
    pub fn from_settings_with_observers(
        settings: Settings,
        observers: Vec<Arc<dyn ChatObserver>>,
    ) -> Result<Self, ChatError> {
        settings.validate()?;
        let transport = build_transport(&settings.backend)?;
        Self::with_transport(transport, settings, observers)
    }

    /// Uses `transport` instead of building one from the backend settings.
    pub fn with_transport(
        transport: Arc<dyn CompletionTransport>,
        settings: Settings,
        observers: Vec<Arc<dyn ChatObserver>>,
    ) -> Result<Self, ChatError> {
        let builder = observers.into_iter().fold(
            traced_chat_service(transport)
                .config(settings.chat)
                .policy(settings.policy),
            |builder, observer| builder.observer(observer),
        );

        Ok(Self {
            service: builder.build()?,
        })
    }

    pub fn service(&self) -> &ChatService {
        &self.service
    }

    /// Applies a changed settings document: a new transport and chat configuration.
    ///
    /// Fails with `AlreadyInProgress` while a turn runs. The turn policy is fixed at build time.
    pub fn reconfigure(&self, settings: Settings) -> Result<(), ChatError> {
        settings.validate()?;
        if self.service.is_turn_in_progress() {
            return Err(ChatError::already_in_progress());
        }

        let transport = build_transport(&settings.backend)?;
        self.service.set_transport(transport)?;
        self.service.reconfigure(settings.chat)
    }
}

impl std::ops::Deref for Assistant {
    type Target = ChatService;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}
