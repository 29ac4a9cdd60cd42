//! Callable function contract for registry-managed capabilities.
//!
//! ```rust
//! use ptooling::{FunctionDescriptor, FunctionTool, Tool};
//!
//! let tool = FunctionTool::new(
//!     FunctionDescriptor::new("echo").with_description("Echoes input"),
//!     |args, _ctx| async move { Ok(args.to_string()) },
//! );
//!
//! assert_eq!(tool.descriptor().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::BoxFuture;
use serde_json::Value;

use crate::{FunctionDescriptor, ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &FunctionDescriptor;

    /// Runs the function with already-parsed arguments and returns its result text.
    fn invoke<'a>(
        &'a self,
        args: Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>>;
}

type ToolHandler =
    dyn Fn(Value, ToolExecutionContext) -> ToolFuture<'static, Result<String, ToolError>> + Send + Sync;

pub struct FunctionTool {
    descriptor: FunctionDescriptor,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(descriptor: FunctionDescriptor, handler: F) -> Self
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |args, context| Box::pin(handler(args, context)));

        Self {
            descriptor,
            handler,
        }
    }

    pub fn from_sync<F>(descriptor: FunctionDescriptor, handler: F) -> Self
    where
        F: Fn(Value, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self::new(descriptor, move |args, context| {
            let output = handler(args, context);
            async move { output }
        })
    }
}

impl Tool for FunctionTool {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn invoke<'a>(
        &'a self,
        args: Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        (self.handler)(args, context.clone())
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
