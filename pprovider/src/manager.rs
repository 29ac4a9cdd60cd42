//! Single-flight streaming request manager.
//!
//! The manager owns at most one in-flight completion request, decodes its chunk stream into a
//! single [`RequestOutcome`] and supports cooperative cancellation through [`RequestManager::abort`].
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pprovider::{
//!     ChatRequest, ChunkStream, CompletionChunk, CompletionTransport, FinishReason,
//!     NoopRequestHooks, ProviderError, ProviderFuture, RequestManager, RequestOutcome, Role,
//!     VecChunkStream, WireMessage,
//! };
//!
//! #[derive(Debug)]
//! struct Scripted;
//!
//! impl CompletionTransport for Scripted {
//!     fn stream<'a>(
//!         &'a self,
//!         _request: ChatRequest,
//!     ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>> {
//!         Box::pin(async move {
//!             let stream = VecChunkStream::new(vec![
//!                 Ok(CompletionChunk::content("Hi")),
//!                 Ok(CompletionChunk::finish(FinishReason::Stop)),
//!             ]);
//!             Ok(Box::pin(stream) as ChunkStream<'a>)
//!         })
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let manager = RequestManager::new(Arc::new(Scripted));
//! let request = ChatRequest::new("gpt-4", vec![WireMessage::new(Role::User, "Hello")]);
//!
//! let outcome = manager.run(request, &NoopRequestHooks).await;
//! assert_eq!(outcome, RequestOutcome::Message("Hi".to_string()));
//! assert!(!manager.is_in_progress());
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{
    ChatRequest, CompletionChunk, CompletionTransport, FinishReason, FunctionCall,
    NoopRequestHooks, ProviderError, RequestHooks,
};

/// Terminal result of one streamed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Message(String),
    FunctionCall(FunctionCall),
    Error(ProviderError),
}

impl RequestOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::FunctionCall(_) => "function_call",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Streaming,
}

#[derive(Debug)]
struct ManagerState {
    phase: RequestPhase,
    cancel: Option<CancellationToken>,
    generation: u64,
    calling_function: bool,
}

pub struct RequestManager {
    transport: RwLock<Arc<dyn CompletionTransport>>,
    hooks: Arc<dyn RequestHooks>,
    state: Mutex<ManagerState>,
}

impl RequestManager {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport: RwLock::new(transport),
            hooks: Arc::new(NoopRequestHooks),
            state: Mutex::new(ManagerState {
                phase: RequestPhase::Idle,
                cancel: None,
                generation: 0,
                calling_function: false,
            }),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn phase(&self) -> RequestPhase {
        self.lock_state().phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase() == RequestPhase::Streaming
    }

    /// Whether the in-flight request has started streaming a function call.
    pub fn is_calling_function(&self) -> bool {
        let state = self.lock_state();
        state.phase == RequestPhase::Streaming && state.calling_function
    }

    pub fn transport(&self) -> Arc<dyn CompletionTransport> {
        let guard = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps the backend used by subsequent requests.
    pub fn set_transport(&self, transport: Arc<dyn CompletionTransport>) -> Result<(), ProviderError> {
        if self.is_in_progress() {
            return Err(ProviderError::already_in_progress());
        }

        let mut guard = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = transport;
        Ok(())
    }

    /// Cancels the in-flight request, if any.
    ///
    /// Returns `true` when a request was streaming. The aborted `run` resolves to
    /// [`RequestOutcome::Error`] with an `Aborted` kind and emits no further events.
    pub fn abort(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase != RequestPhase::Streaming {
            return false;
        }

        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.phase = RequestPhase::Idle;
        state.calling_function = false;
        true
    }

    /// Streams `request` to completion and returns its terminal outcome.
    ///
    /// Events are delivered to the manager's hooks and to `observer`, in chunk order.
    pub async fn run(&self, request: ChatRequest, observer: &dyn RequestHooks) -> RequestOutcome {
        let (token, generation) = match self.begin() {
            Ok(flight) => flight,
            Err(error) => return RequestOutcome::Error(error),
        };
        let guard = FlightGuard {
            state: &self.state,
            generation,
        };

        let started_at = Instant::now();
        self.hooks.on_request_start(&request);
        observer.on_request_start(&request);

        let transport = self.transport();
        let flight = Flight {
            manager: self,
            observer,
            token: &token,
            generation,
        };
        let outcome = flight.drive(transport.as_ref(), request).await;
        drop(guard);

        let elapsed = started_at.elapsed();
        self.hooks.on_request_complete(&outcome, elapsed);
        observer.on_request_complete(&outcome, elapsed);
        outcome
    }

    fn begin(&self) -> Result<(CancellationToken, u64), ProviderError> {
        let mut state = self.lock_state();
        if state.phase == RequestPhase::Streaming {
            return Err(ProviderError::already_in_progress());
        }

        let token = CancellationToken::new();
        state.generation = state.generation.wrapping_add(1);
        state.phase = RequestPhase::Streaming;
        state.cancel = Some(token.clone());
        state.calling_function = false;
        Ok((token, state.generation))
    }

    fn mark_calling_function(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation && state.phase == RequestPhase::Streaming {
            state.calling_function = true;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("RequestManager")
            .field("phase", &state.phase)
            .field("generation", &state.generation)
            .field("calling_function", &state.calling_function)
            .finish_non_exhaustive()
    }
}

/// Returns the manager to `Idle` when a run exits, unless a newer run already owns it.
struct FlightGuard<'a> {
    state: &'a Mutex<ManagerState>,
    generation: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != self.generation || state.phase != RequestPhase::Streaming {
            return;
        }

        state.phase = RequestPhase::Idle;
        state.cancel = None;
        state.calling_function = false;
    }
}

struct Flight<'a> {
    manager: &'a RequestManager,
    observer: &'a dyn RequestHooks,
    token: &'a CancellationToken,
    generation: u64,
}

impl Flight<'_> {
    async fn drive(&self, transport: &dyn CompletionTransport, request: ChatRequest) -> RequestOutcome {
        if let Err(error) = request.validate() {
            return RequestOutcome::Error(error);
        }

        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => return RequestOutcome::Error(ProviderError::aborted()),
            opened = transport.stream(request) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => return RequestOutcome::Error(error),
        };

        let mut accumulator = StreamAccumulator::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return RequestOutcome::Error(ProviderError::aborted()),
                next = stream.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(error)) => return RequestOutcome::Error(error),
                None if self.token.is_cancelled() => {
                    return RequestOutcome::Error(ProviderError::aborted());
                }
                None => {
                    return RequestOutcome::Error(ProviderError::transport(
                        "request interrupted before a finish marker",
                    ));
                }
            };

            let progress = match accumulator.apply(chunk) {
                Ok(progress) => progress,
                Err(error) => return RequestOutcome::Error(error),
            };

            // An abort may land between chunks; nothing of the cancelled run is reported.
            if self.token.is_cancelled() {
                return RequestOutcome::Error(ProviderError::aborted());
            }

            if let Some(delta) = &progress.content {
                self.manager.hooks.on_content_delta(delta);
                self.observer.on_content_delta(delta);
            }

            if let Some(name) = &progress.call_started {
                self.manager.mark_calling_function(self.generation);
                self.manager.hooks.on_function_call_started(name);
                self.observer.on_function_call_started(name);
            }

            if let Some(outcome) = progress.outcome {
                return outcome;
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Progress {
    content: Option<String>,
    call_started: Option<String>,
    outcome: Option<RequestOutcome>,
}

/// Pure chunk decoder holding the text and function-call accumulators of one request.
#[derive(Debug, Default)]
struct StreamAccumulator {
    content: String,
    call_name: Option<String>,
    arguments: String,
}

impl StreamAccumulator {
    fn apply(&mut self, chunk: CompletionChunk) -> Result<Progress, ProviderError> {
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Err(ProviderError::protocol_violation(
                "completion chunk carried no choices",
            ));
        };

        let mut progress = Progress::default();
        if let Some(text) = choice.delta.content {
            if !text.is_empty() {
                self.content.push_str(&text);
                progress.content = Some(text);
            }
        }

        if let Some(call) = choice.delta.function_call {
            if self.call_name.is_none() {
                if let Some(name) = call.name.filter(|name| !name.is_empty()) {
                    self.call_name = Some(name.clone());
                    progress.call_started = Some(name);
                }
            }

            if let Some(arguments) = call.arguments {
                self.arguments.push_str(&arguments);
            }
        }

        progress.outcome = match choice.finish_reason {
            None => None,
            Some(FinishReason::Stop) => {
                Some(RequestOutcome::Message(std::mem::take(&mut self.content)))
            }
            Some(FinishReason::FunctionCall) => match self.call_name.take() {
                Some(name) => Some(RequestOutcome::FunctionCall(FunctionCall::new(
                    name,
                    std::mem::take(&mut self.arguments),
                ))),
                None => {
                    return Err(ProviderError::protocol_violation(
                        "function_call finish without a function call in progress",
                    ));
                }
            },
            Some(FinishReason::Other(reason)) => {
                return Err(ProviderError::protocol_violation(format!(
                    "unexpected finish reason '{reason}'"
                )));
            }
        };

        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn content_deltas_accumulate_until_stop() {
        let mut accumulator = StreamAccumulator::default();

        let first = accumulator
            .apply(CompletionChunk::content("Hi"))
            .expect("delta should apply");
        assert_eq!(first.content.as_deref(), Some("Hi"));
        assert!(first.outcome.is_none());

        accumulator
            .apply(CompletionChunk::content(" there"))
            .expect("delta should apply");
        let done = accumulator
            .apply(CompletionChunk::finish(FinishReason::Stop))
            .expect("stop should apply");

        assert_eq!(
            done.outcome,
            Some(RequestOutcome::Message("Hi there".to_string()))
        );
        assert!(done.call_started.is_none());
    }

    #[test]
    fn call_start_is_reported_once_and_arguments_concatenate() {
        let mut accumulator = StreamAccumulator::default();

        let first = accumulator
            .apply(CompletionChunk::function_call(Some("lookup"), Some("{\"q\":")))
            .expect("call delta should apply");
        assert_eq!(first.call_started.as_deref(), Some("lookup"));

        let second = accumulator
            .apply(CompletionChunk::function_call(Some("ignored"), Some("\"rust\"}")))
            .expect("call delta should apply");
        assert!(second.call_started.is_none());

        let done = accumulator
            .apply(CompletionChunk::finish(FinishReason::FunctionCall))
            .expect("finish should apply");
        assert_eq!(
            done.outcome,
            Some(RequestOutcome::FunctionCall(FunctionCall::new(
                "lookup",
                "{\"q\":\"rust\"}"
            )))
        );
    }

    #[test]
    fn malformed_shapes_are_protocol_violations() {
        let mut accumulator = StreamAccumulator::default();
        let empty = accumulator
            .apply(CompletionChunk::default())
            .expect_err("empty choices must fail");
        assert_eq!(empty.kind, ProviderErrorKind::ProtocolViolation);

        let orphan = StreamAccumulator::default()
            .apply(CompletionChunk::finish(FinishReason::FunctionCall))
            .expect_err("call finish without a call must fail");
        assert_eq!(orphan.kind, ProviderErrorKind::ProtocolViolation);

        let length = StreamAccumulator::default()
            .apply(CompletionChunk::finish(FinishReason::Other("length".into())))
            .expect_err("unknown finish must fail");
        assert_eq!(length.kind, ProviderErrorKind::ProtocolViolation);
    }

    #[test]
    fn abort_while_idle_is_a_noop() {
        #[derive(Debug)]
        struct Unused;

        impl CompletionTransport for Unused {
            fn stream<'a>(
                &'a self,
                _request: ChatRequest,
            ) -> crate::ProviderFuture<'a, Result<crate::ChunkStream<'a>, ProviderError>> {
                Box::pin(async move { Err(ProviderError::unavailable("unused")) })
            }
        }

        let manager = RequestManager::new(Arc::new(Unused));
        assert!(!manager.abort());
        assert_eq!(manager.phase(), RequestPhase::Idle);
        assert!(!manager.is_calling_function());
    }
}
