//! Tracing-based observability hooks for request, function runtime and chat-turn phases.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pprovider::RequestHooks;
//!
//! fn accepts_request_hooks(_hooks: &dyn RequestHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_request_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatErrorKind, ChatEvent, ChatObserver};
use pprovider::{ChatRequest, FunctionCall, RequestHooks, RequestOutcome};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl RequestHooks for TracingObservabilityHooks {
    fn on_request_start(&self, request: &ChatRequest) {
        tracing::info!(
            phase = "request",
            event = "start",
            model = request.model,
            messages = request.messages.len(),
            functions = request.functions.len()
        );
    }

    fn on_content_delta(&self, delta: &str) {
        tracing::trace!(phase = "request", event = "content_delta", bytes = delta.len());
    }

    fn on_function_call_started(&self, name: &str) {
        tracing::info!(
            phase = "request",
            event = "function_call_started",
            function_name = name
        );
    }

    fn on_request_complete(&self, outcome: &RequestOutcome, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            RequestOutcome::Message(content) => tracing::info!(
                phase = "request",
                event = "complete",
                outcome = outcome.label(),
                content_bytes = content.len(),
                elapsed_ms
            ),
            RequestOutcome::FunctionCall(call) => tracing::info!(
                phase = "request",
                event = "complete",
                outcome = outcome.label(),
                function_name = call.name,
                elapsed_ms
            ),
            RequestOutcome::Error(error) if error.is_aborted() => tracing::warn!(
                phase = "request",
                event = "aborted",
                outcome = outcome.label(),
                elapsed_ms
            ),
            RequestOutcome::Error(error) => tracing::error!(
                phase = "request",
                event = "failure",
                outcome = outcome.label(),
                elapsed_ms,
                error_kind = ?error.kind,
                retryable = error.retryable,
                error = %error
            ),
        }
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "function",
            event = "execution_start",
            function_name = call.name,
            message_id = %context.message_id
        );
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "function",
            event = "execution_success",
            function_name = call.name,
            message_id = %context.message_id,
            output_bytes = result.output.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "function",
            event = "execution_failure",
            function_name = call.name,
            message_id = %context.message_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl ChatObserver for TracingObservabilityHooks {
    fn on_event(&self, event: &ChatEvent) {
        match event {
            ChatEvent::UserRequest(message) => tracing::debug!(
                phase = "chat",
                event = event.name(),
                message_id = %message.id,
                annotations = message.annotations.len()
            ),
            ChatEvent::UserPromptEcho { id, .. } => {
                tracing::info!(phase = "chat", event = event.name(), message_id = %id)
            }
            ChatEvent::ContentDelta { message_id, .. } => {
                tracing::trace!(phase = "chat", event = event.name(), message_id = %message_id)
            }
            ChatEvent::FunctionCallStarted {
                message_id, name, ..
            }
            | ChatEvent::FunctionResult { message_id, name } => tracing::debug!(
                phase = "chat",
                event = event.name(),
                message_id = %message_id,
                function_name = name
            ),
            ChatEvent::TurnFinished { message_id } => {
                tracing::info!(phase = "chat", event = event.name(), message_id = %message_id)
            }
            ChatEvent::TurnError { kind, message, .. } if *kind == ChatErrorKind::Aborted => {
                tracing::warn!(phase = "chat", event = event.name(), error_kind = ?kind, error = message)
            }
            ChatEvent::TurnError {
                kind,
                message,
                cause,
            } => tracing::error!(
                phase = "chat",
                event = event.name(),
                error_kind = ?kind,
                error = message,
                cause = cause.as_deref().unwrap_or("")
            ),
            ChatEvent::HistoryCleared => tracing::info!(phase = "chat", event = event.name()),
        }
    }
}
