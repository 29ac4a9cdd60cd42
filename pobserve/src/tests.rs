use std::sync::{Arc, Mutex};
use std::time::Duration;

use pchat::{ChatErrorKind, ChatEvent, ChatObserver};
use pcommon::MessageId;
use pprovider::{
    ChatRequest, FunctionCall, ProviderError, RequestHooks, RequestOutcome, Role, WireMessage,
};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

use crate::{
    MetricsObservabilityHooks, SafeChatObserver, SafeRequestHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn sample_request() -> ChatRequest {
    ChatRequest::new("gpt-4", vec![WireMessage::new(Role::User, "Hello")]).enable_streaming()
}

fn sample_call() -> FunctionCall {
    FunctionCall::new("getTime", "{}")
}

fn sample_context() -> ToolExecutionContext {
    ToolExecutionContext::new("call-1")
}

fn sample_outcomes() -> Vec<RequestOutcome> {
    vec![
        RequestOutcome::Message("Hi there".to_string()),
        RequestOutcome::FunctionCall(sample_call()),
        RequestOutcome::Error(ProviderError::aborted()),
        RequestOutcome::Error(ProviderError::timeout("stream stalled")),
    ]
}

fn sample_events() -> Vec<ChatEvent> {
    let id = MessageId::new("m-1");
    vec![
        ChatEvent::UserPromptEcho {
            id: id.clone(),
            text: "Hello".to_string(),
        },
        ChatEvent::ContentDelta {
            message_id: id.clone(),
            delta: "Hi".to_string(),
        },
        ChatEvent::FunctionCallStarted {
            message_id: id.clone(),
            name: "getTime".to_string(),
            status: Some("Checking the clock...".to_string()),
        },
        ChatEvent::FunctionResult {
            message_id: id.clone(),
            name: "getTime".to_string(),
        },
        ChatEvent::TurnFinished { message_id: id },
        ChatEvent::TurnError {
            kind: ChatErrorKind::Aborted,
            message: "turn aborted".to_string(),
            cause: None,
        },
        ChatEvent::TurnError {
            kind: ChatErrorKind::TransportFailure,
            message: "connection reset".to_string(),
            cause: Some("os error 104".to_string()),
        },
        ChatEvent::HistoryCleared,
    ]
}

fn exercise_request_hooks(hooks: &dyn RequestHooks) {
    hooks.on_request_start(&sample_request());
    hooks.on_content_delta("Hi");
    hooks.on_function_call_started("getTime");
    for outcome in sample_outcomes() {
        hooks.on_request_complete(&outcome, Duration::from_millis(15));
    }
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    hooks.on_execution_start(&sample_call(), &sample_context());
    hooks.on_execution_success(
        &sample_call(),
        &sample_context(),
        &ToolExecutionResult::new("getTime", "12:00"),
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        &sample_call(),
        &sample_context(),
        &ToolError::execution("clock unavailable"),
        Duration::from_millis(20),
    );
}

fn exercise_chat_observer(observer: &dyn ChatObserver) {
    for event in sample_events() {
        observer.on_event(&event);
    }
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;

    exercise_request_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_observer(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;

    exercise_request_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_chat_observer(&hooks);
}

#[derive(Default, Clone)]
struct Recording {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl Recording {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }

    fn len(&self) -> usize {
        self.events.lock().expect("events lock").len()
    }
}

impl RequestHooks for Recording {
    fn on_request_start(&self, _request: &ChatRequest) {
        self.push("start");
    }

    fn on_content_delta(&self, _delta: &str) {
        self.push("delta");
    }

    fn on_function_call_started(&self, _name: &str) {
        self.push("call_started");
    }

    fn on_request_complete(&self, _outcome: &RequestOutcome, _elapsed: Duration) {
        self.push("complete");
    }
}

impl ToolRuntimeHooks for Recording {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {
        self.push("start");
    }

    fn on_execution_success(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        self.push("success");
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl ChatObserver for Recording {
    fn on_event(&self, event: &ChatEvent) {
        self.push(event.name());
    }
}

struct Panicking;

impl RequestHooks for Panicking {
    fn on_request_start(&self, _request: &ChatRequest) {
        panic!("start panic");
    }

    fn on_content_delta(&self, _delta: &str) {
        panic!("delta panic");
    }

    fn on_function_call_started(&self, _name: &str) {
        panic!("call panic");
    }

    fn on_request_complete(&self, _outcome: &RequestOutcome, _elapsed: Duration) {
        panic!("complete panic");
    }
}

impl ToolRuntimeHooks for Panicking {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_execution_success(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        panic!("success panic");
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl ChatObserver for Panicking {
    fn on_event(&self, _event: &ChatEvent) {
        panic!("observer panic");
    }
}

#[test]
fn safe_wrappers_delegate_when_inner_succeeds() {
    let request = Recording::default();
    exercise_request_hooks(&SafeRequestHooks::new(request.clone()));
    assert_eq!(request.len(), 3 + sample_outcomes().len());

    let tool = Recording::default();
    exercise_tool_hooks(&SafeToolHooks::new(tool.clone()));
    assert_eq!(tool.len(), 3);

    let chat = Recording::default();
    exercise_chat_observer(&SafeChatObserver::new(chat.clone()));
    assert_eq!(chat.len(), sample_events().len());
}

#[test]
fn safe_wrappers_swallow_panics() {
    exercise_request_hooks(&SafeRequestHooks::new(Panicking));
    exercise_tool_hooks(&SafeToolHooks::new(Panicking));
    exercise_chat_observer(&SafeChatObserver::new(Panicking));
}
