//! Transaction orchestration: user prompt, streamed turns, function dispatch and re-request.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pcommon::MessageId;
use pprovider::{
    ChatRequest, CompletionTransport, FunctionCall, Message, NoopRequestHooks, RequestHooks,
    RequestManager, RequestOutcome, RequestPhase,
};
use ptooling::{
    DefaultToolRuntime, FunctionDescriptor, FunctionRegistry, Tool, ToolError,
    ToolExecutionContext, ToolRuntime,
};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    ChatConfig, ChatError, ChatEvent, ChatObserver, ConversationHistory, FanoutObserver,
    SystemPromptSynthesizer, UserPrompt,
};

pub const DEFAULT_MAX_CHAINED_TURNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatPolicy {
    /// Function calls a single prompt may run. The next call is recorded but not run, and the
    /// turn fails with `CallLimitExceeded`.
    pub max_chained_turns: usize,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_chained_turns: DEFAULT_MAX_CHAINED_TURNS,
        }
    }
}

impl ChatPolicy {
    pub fn with_max_chained_turns(mut self, max_chained_turns: usize) -> Self {
        self.max_chained_turns = max_chained_turns;
        self
    }
}

struct ServiceState {
    history: ConversationHistory,
    registry: FunctionRegistry,
    config: ChatConfig,
    turn_in_progress: bool,
    turn_generation: u64,
    cancel: Option<CancellationToken>,
    correlation_id: Option<MessageId>,
}

impl ServiceState {
    fn clear_turn(&mut self) {
        self.turn_in_progress = false;
        self.cancel = None;
        self.correlation_id = None;
    }
}

pub struct ChatServiceBuilder {
    transport: Arc<dyn CompletionTransport>,
    config: ChatConfig,
    policy: ChatPolicy,
    registry: FunctionRegistry,
    runtime: Arc<dyn ToolRuntime>,
    request_hooks: Arc<dyn RequestHooks>,
    observers: FanoutObserver,
}

impl ChatServiceBuilder {
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_chained_turns(mut self, max_chained_turns: usize) -> Self {
        self.policy.max_chained_turns = max_chained_turns;
        self
    }

    pub fn functions(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn tool_runtime(mut self, runtime: Arc<dyn ToolRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn request_hooks(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.request_hooks = hooks;
        self
    }

    /// Adds an observer; every registered observer sees every event.
    pub fn observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<ChatService, ChatError> {
        self.config.validate()?;

        let observer: Arc<dyn ChatObserver> = Arc::new(self.observers);
        let synthesizer = SystemPromptSynthesizer::new(
            self.config.system_prompt.clone(),
            self.config.supports_system_role(),
        );
        let history = ConversationHistory::with_observer(
            self.config.max_history,
            synthesizer,
            Arc::clone(&observer),
        );

        Ok(ChatService {
            manager: RequestManager::new(self.transport).with_hooks(self.request_hooks),
            runtime: self.runtime,
            observer,
            policy: self.policy,
            state: Mutex::new(ServiceState {
                history,
                registry: self.registry,
                config: self.config,
                turn_in_progress: false,
                turn_generation: 0,
                cancel: None,
                correlation_id: None,
            }),
        })
    }
}

/// Owns one conversation and drives its request, function-call and re-request loop.
///
/// Only one turn runs at a time. Host mutations fail with `AlreadyInProgress` while it does.
pub struct ChatService {
    manager: RequestManager,
    runtime: Arc<dyn ToolRuntime>,
    observer: Arc<dyn ChatObserver>,
    policy: ChatPolicy,
    state: Mutex<ServiceState>,
}

impl ChatService {
    pub fn builder(transport: Arc<dyn CompletionTransport>) -> ChatServiceBuilder {
        ChatServiceBuilder {
            transport,
            config: ChatConfig::default(),
            policy: ChatPolicy::default(),
            registry: FunctionRegistry::new(),
            runtime: Arc::new(DefaultToolRuntime::new()),
            request_hooks: Arc::new(NoopRequestHooks),
            observers: FanoutObserver::default(),
        }
    }

    /// Runs a full transaction for `prompt`.
    ///
    /// Returns `false` without touching history when the prompt is blank or a turn is already
    /// running; otherwise `true` once the turn reached its terminal outcome.
    pub async fn send_user_prompt(&self, prompt: impl Into<UserPrompt>) -> bool {
        let Ok(turn) = self.start_prompt(prompt.into()) else {
            return false;
        };

        let _ = self.complete(turn).await;
        true
    }

    /// Same transaction as [`ChatService::send_user_prompt`], returning the final assistant
    /// message id or the error that ended the turn.
    pub async fn prompt(&self, prompt: impl Into<UserPrompt>) -> Result<MessageId, ChatError> {
        let turn = self.start_prompt(prompt.into())?;
        self.complete(turn).await
    }

    /// Re-runs a transaction over the stored history, typically after an edit.
    pub async fn resend(&self) -> Result<MessageId, ChatError> {
        let turn = self.begin_turn(|state| {
            if state.history.is_empty() {
                return Err(ChatError::invalid_request("history is empty"));
            }
            Ok(())
        })?;
        self.complete(turn).await
    }

    /// Cancels the running turn. The system is idle again when this returns.
    pub fn abort(&self) -> bool {
        let token = {
            let mut state = self.lock_state();
            if !state.turn_in_progress {
                return false;
            }
            let token = state.cancel.take();
            state.clear_turn();
            token
        };

        if let Some(token) = token {
            token.cancel();
        }
        self.manager.abort();
        true
    }

    pub fn is_turn_in_progress(&self) -> bool {
        self.lock_state().turn_in_progress
    }

    pub fn request_phase(&self) -> RequestPhase {
        self.manager.phase()
    }

    pub fn history(&self) -> Vec<Message> {
        self.lock_state().history.messages().to_vec()
    }

    pub fn config(&self) -> ChatConfig {
        self.lock_state().config.clone()
    }

    pub fn policy(&self) -> ChatPolicy {
        self.policy
    }

    pub fn function_status(&self, name: &str) -> Option<String> {
        self.lock_state().registry.status_message(name)
    }

    pub fn function_names(&self) -> Vec<String> {
        self.lock_state()
            .registry
            .names()
            .map(str::to_string)
            .collect()
    }

    pub fn mixin_keys(&self) -> Vec<String> {
        self.lock_state()
            .history
            .synthesizer()
            .mixin_keys()
            .map(str::to_string)
            .collect()
    }

    /// Request for the next model turn: synthesized prompt plus the windowed history.
    pub fn build_request(&self) -> ChatRequest {
        let state = self.lock_state();
        ChatRequest::new(state.config.model.clone(), state.history.render())
            .with_functions(state.registry.definitions())
            .with_sampling(state.config.sampling())
            .enable_streaming()
    }

    pub fn annotate_user_prompt(
        &self,
        id: &MessageId,
        annotation: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.with_idle_state(|state| state.history.annotate_user(id, annotation))
    }

    /// Replaces a stored user prompt and drops everything after it; follow with
    /// [`ChatService::resend`] to get a new answer.
    pub fn edit_user_prompt(&self, id: &MessageId, text: impl Into<String>) -> Result<(), ChatError> {
        self.with_idle_state(|state| state.history.edit_user(id, text))
    }

    pub fn remove_message(&self, id: &MessageId) -> Result<Message, ChatError> {
        self.with_idle_state(|state| state.history.remove_by_id(id))
    }

    pub fn clear_history(&self) -> Result<(), ChatError> {
        self.with_idle_state(|state| {
            state.history.clear();
            Ok(())
        })
    }

    pub fn register_function<T>(&self, tool: T) -> Result<(), ChatError>
    where
        T: Tool + 'static,
    {
        self.with_idle_state(|state| Ok(state.registry.register(tool)?))
    }

    /// Registers every tool or none of them.
    pub fn register_functions<I>(&self, tools: I) -> Result<(), ChatError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        self.with_idle_state(|state| {
            let mut registry = state.registry.clone();
            for tool in tools {
                registry.register_shared(tool)?;
            }
            state.registry = registry;
            Ok(())
        })
    }

    pub fn register_fn<F, Fut>(&self, descriptor: FunctionDescriptor, handler: F) -> Result<(), ChatError>
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.with_idle_state(|state| Ok(state.registry.register_fn(descriptor, handler)?))
    }

    pub fn register_sync_fn<F>(&self, descriptor: FunctionDescriptor, handler: F) -> Result<(), ChatError>
    where
        F: Fn(Value, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.with_idle_state(|state| Ok(state.registry.register_sync_fn(descriptor, handler)?))
    }

    pub fn remove_function(&self, name: &str) -> Result<bool, ChatError> {
        self.with_idle_state(|state| Ok(state.registry.remove(name)))
    }

    pub fn add_mixin(&self, key: impl Into<String>, text: impl Into<String>) -> Result<(), ChatError> {
        self.with_idle_state(|state| state.history.synthesizer_mut().add_mixin(key, text))
    }

    pub fn remove_mixin(&self, key: &str) -> Result<bool, ChatError> {
        self.with_idle_state(|state| Ok(state.history.synthesizer_mut().remove_mixin(key)))
    }

    /// Applies a new configuration to subsequent turns.
    pub fn reconfigure(&self, config: ChatConfig) -> Result<(), ChatError> {
        config.validate()?;
        self.with_idle_state(|state| {
            state.history.set_window(config.max_history);
            let synthesizer = state.history.synthesizer_mut();
            synthesizer.set_base_prompt(config.system_prompt.clone());
            synthesizer.set_system_role(config.supports_system_role());
            state.config = config;
            Ok(())
        })
    }

    pub fn set_transport(&self, transport: Arc<dyn CompletionTransport>) -> Result<(), ChatError> {
        self.with_idle_state(|_| Ok(self.manager.set_transport(transport)?))
    }

    fn start_prompt(&self, prompt: UserPrompt) -> Result<ActiveTurn<'_>, ChatError> {
        if prompt.text.trim().is_empty() {
            return Err(ChatError::invalid_request("prompt must not be empty"));
        }

        let id = MessageId::generate();
        let text = prompt.text.clone();
        let message = prompt.into_message(id.clone());
        let turn = self.begin_turn(|state| {
            state.history.append_user_message(message);
            Ok(())
        })?;

        self.observer
            .on_event(&ChatEvent::UserPromptEcho { id, text });
        Ok(turn)
    }

    fn begin_turn(
        &self,
        prepare: impl FnOnce(&mut ServiceState) -> Result<(), ChatError>,
    ) -> Result<ActiveTurn<'_>, ChatError> {
        let mut state = self.lock_state();
        if state.turn_in_progress {
            return Err(ChatError::already_in_progress());
        }

        prepare(&mut state)?;

        let token = CancellationToken::new();
        state.turn_in_progress = true;
        state.turn_generation = state.turn_generation.wrapping_add(1);
        state.cancel = Some(token.clone());
        state.correlation_id = None;

        Ok(ActiveTurn {
            state: &self.state,
            token,
            generation: state.turn_generation,
        })
    }

    async fn complete(&self, turn: ActiveTurn<'_>) -> Result<MessageId, ChatError> {
        let result = self.drive(&turn.token).await;
        drop(turn);

        match &result {
            Ok(message_id) => self.observer.on_event(&ChatEvent::TurnFinished {
                message_id: message_id.clone(),
            }),
            Err(error) => self.observer.on_event(&ChatEvent::TurnError {
                kind: error.kind,
                message: error.message.clone(),
                cause: error.cause.clone(),
            }),
        }

        result
    }

    async fn drive(&self, token: &CancellationToken) -> Result<MessageId, ChatError> {
        let mut chained = 0_usize;
        loop {
            if token.is_cancelled() {
                return Err(ChatError::aborted());
            }

            let request = self.build_request();
            let observer = TurnObserver { service: self };
            match self.manager.run(request, &observer).await {
                RequestOutcome::Message(content) => {
                    let mut state = self.lock_state();
                    if token.is_cancelled() {
                        return Err(ChatError::aborted());
                    }
                    let id = take_correlation_id(&mut state);
                    state.history.append_assistant_text(id.clone(), content);
                    return Ok(id);
                }
                RequestOutcome::FunctionCall(call) => {
                    chained += 1;
                    if chained > self.policy.max_chained_turns {
                        self.record_call(&call, token)?;
                        return Err(ChatError::call_limit_exceeded(self.policy.max_chained_turns));
                    }
                    self.dispatch(call, token).await?;
                }
                RequestOutcome::Error(_) if token.is_cancelled() => {
                    return Err(ChatError::aborted());
                }
                RequestOutcome::Error(error) => return Err(error.into()),
            }
        }
    }

    /// Appends the assistant message carrying `call` and looks up its function.
    fn record_call(
        &self,
        call: &FunctionCall,
        token: &CancellationToken,
    ) -> Result<(MessageId, Option<Arc<dyn Tool>>), ChatError> {
        let mut state = self.lock_state();
        if token.is_cancelled() {
            return Err(ChatError::aborted());
        }
        let call_id = take_correlation_id(&mut state);
        state
            .history
            .append_assistant_call(call_id.clone(), call.clone());
        Ok((call_id, state.registry.get(&call.name)))
    }

    async fn dispatch(&self, call: FunctionCall, token: &CancellationToken) -> Result<(), ChatError> {
        let (call_id, tool) = self.record_call(&call, token)?;

        let name = call.name.clone();
        let output = match tool {
            Some(tool) => {
                let context = ToolExecutionContext::new(call_id);
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(ChatError::aborted()),
                    result = self.runtime.execute(tool, call, context) => result?,
                };
                result.output
            }
            None => format!("Function '{name}' does not exist."),
        };

        let result_id = MessageId::generate();
        {
            let mut state = self.lock_state();
            if token.is_cancelled() {
                return Err(ChatError::aborted());
            }
            state
                .history
                .append_function_result(result_id.clone(), name.clone(), output);
        }

        self.observer.on_event(&ChatEvent::FunctionResult {
            message_id: result_id,
            name,
        });
        Ok(())
    }

    fn with_idle_state<T>(
        &self,
        apply: impl FnOnce(&mut ServiceState) -> Result<T, ChatError>,
    ) -> Result<T, ChatError> {
        let mut state = self.lock_state();
        if state.turn_in_progress {
            return Err(ChatError::already_in_progress());
        }

        apply(&mut state)
    }

    /// Id shared by every event of the current model turn, created on first use.
    fn correlation_id(&self) -> MessageId {
        let mut state = self.lock_state();
        state
            .correlation_id
            .get_or_insert_with(MessageId::generate)
            .clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("policy", &self.policy)
            .field("phase", &self.manager.phase())
            .finish_non_exhaustive()
    }
}

/// Consumes the current correlation id so the next model turn gets a fresh one.
fn take_correlation_id(state: &mut ServiceState) -> MessageId {
    state.correlation_id.take().unwrap_or_else(MessageId::generate)
}

struct ActiveTurn<'a> {
    state: &'a Mutex<ServiceState>,
    token: CancellationToken,
    generation: u64,
}

impl Drop for ActiveTurn<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.turn_generation == self.generation {
            state.clear_turn();
        }
    }
}

struct TurnObserver<'a> {
    service: &'a ChatService,
}

impl RequestHooks for TurnObserver<'_> {
    fn on_content_delta(&self, delta: &str) {
        let message_id = self.service.correlation_id();
        self.service.observer.on_event(&ChatEvent::ContentDelta {
            message_id,
            delta: delta.to_string(),
        });
    }

    fn on_function_call_started(&self, name: &str) {
        let message_id = self.service.correlation_id();
        let status = self.service.function_status(name);
        self.service.observer.on_event(&ChatEvent::FunctionCallStarted {
            message_id,
            name: name.to_string(),
            status,
        });
    }
}
