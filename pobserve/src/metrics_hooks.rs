//! Metrics-based observability hooks for request, function runtime and chat-turn phases.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use ptooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_tool_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatEvent, ChatObserver};
use pprovider::{ChatRequest, FunctionCall, RequestHooks, RequestOutcome};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl RequestHooks for MetricsObservabilityHooks {
    fn on_request_start(&self, request: &ChatRequest) {
        metrics::counter!(
            "palaver_request_start_total",
            "model" => request.model.clone()
        )
        .increment(1);
        metrics::histogram!(
            "palaver_request_messages",
            "model" => request.model.clone()
        )
        .record(request.messages.len() as f64);
    }

    fn on_content_delta(&self, _delta: &str) {
        metrics::counter!("palaver_content_delta_total").increment(1);
    }

    fn on_function_call_started(&self, name: &str) {
        metrics::counter!(
            "palaver_function_call_started_total",
            "function_name" => name.to_string()
        )
        .increment(1);
    }

    fn on_request_complete(&self, outcome: &RequestOutcome, elapsed: Duration) {
        metrics::counter!(
            "palaver_request_complete_total",
            "outcome" => outcome.label()
        )
        .increment(1);
        metrics::histogram!(
            "palaver_request_duration_seconds",
            "outcome" => outcome.label()
        )
        .record(elapsed.as_secs_f64());

        if let RequestOutcome::Error(error) = outcome {
            metrics::counter!(
                "palaver_request_failure_total",
                "error_kind" => format!("{:?}", error.kind)
            )
            .increment(1);
        }
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "palaver_function_execution_start_total",
            "function_name" => call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "palaver_function_execution_success_total",
            "function_name" => call.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "palaver_function_execution_duration_seconds",
            "function_name" => call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "palaver_function_execution_failure_total",
            "function_name" => call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "palaver_function_execution_duration_seconds",
            "function_name" => call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ChatObserver for MetricsObservabilityHooks {
    fn on_event(&self, event: &ChatEvent) {
        match event {
            ChatEvent::ContentDelta { .. } => {}
            ChatEvent::FunctionResult { name, .. } => {
                metrics::counter!(
                    "palaver_function_result_total",
                    "function_name" => name.clone()
                )
                .increment(1);
            }
            ChatEvent::TurnError { kind, .. } => {
                metrics::counter!(
                    "palaver_turn_error_total",
                    "error_kind" => format!("{kind:?}")
                )
                .increment(1);
            }
            _ => {
                metrics::counter!("palaver_chat_event_total", "event" => event.name()).increment(1);
            }
        }
    }
}
