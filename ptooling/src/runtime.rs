//! Function runtime trait and the default hook-reporting executor.

use std::sync::Arc;
use std::time::Instant;

use pprovider::FunctionCall;

use crate::{
    NoopToolRuntimeHooks, Tool, ToolError, ToolExecutionContext, ToolExecutionResult, ToolFuture,
    ToolRuntimeHooks, parse_arguments,
};

pub trait ToolRuntime: Send + Sync {
    /// Parses the call's argument text and runs `tool` with it.
    ///
    /// Argument text that is not JSON fails with `MalformedArguments` before the tool runs.
    fn execute<'a>(
        &'a self,
        tool: Arc<dyn Tool>,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl Default for DefaultToolRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultToolRuntime {
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn execute<'a>(
        &'a self,
        tool: Arc<dyn Tool>,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(&call, &context);
            let started_at = Instant::now();

            let result = match parse_arguments(&call.arguments) {
                Ok(args) => tool
                    .invoke(args, &context)
                    .await
                    .map(|output| ToolExecutionResult::new(call.name.clone(), output)),
                Err(error) => Err(error),
            }
            .map_err(|error| match error.function_name {
                Some(_) => error,
                None => error.with_function_name(call.name.clone()),
            });

            let elapsed = started_at.elapsed();
            match &result {
                Ok(output) => self
                    .hooks
                    .on_execution_success(&call, &context, output, elapsed),
                Err(error) => self
                    .hooks
                    .on_execution_failure(&call, &context, error, elapsed),
            }

            result
        })
    }
}

impl std::fmt::Debug for DefaultToolRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultToolRuntime").finish_non_exhaustive()
    }
}
