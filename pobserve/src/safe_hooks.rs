use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pchat::{ChatEvent, ChatObserver};
use pprovider::{ChatRequest, FunctionCall, RequestHooks, RequestOutcome};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

pub struct SafeRequestHooks<H> {
    inner: H,
}

impl<H> SafeRequestHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> RequestHooks for SafeRequestHooks<H>
where
    H: RequestHooks,
{
    fn on_request_start(&self, request: &ChatRequest) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_request_start(request)));
    }

    fn on_content_delta(&self, delta: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_content_delta(delta)));
    }

    fn on_function_call_started(&self, name: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_function_call_started(name)
        }));
    }

    fn on_request_complete(&self, outcome: &RequestOutcome, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_request_complete(outcome, elapsed)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(call, context)
        }));
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(call, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(call, context, error, elapsed)
        }));
    }
}

/// Keeps a panicking observer from tearing down the turn that emitted the event.
pub struct SafeChatObserver<O> {
    inner: O,
}

impl<O> SafeChatObserver<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<O> ChatObserver for SafeChatObserver<O>
where
    O: ChatObserver,
{
    fn on_event(&self, event: &ChatEvent) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_event(event)));
    }
}
