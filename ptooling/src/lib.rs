//! Function registry, argument helpers and the tool runtime.

mod args;
mod descriptor;
mod error;
mod hooks;
mod registry;
mod runtime;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, FunctionDescriptor, FunctionRegistry, FunctionTool,
        ParameterDescriptor, ParameterType, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolFuture, ToolRuntime, ToolRuntimeHooks,
    };
}

pub use args::{
    optional_string, parse_arguments, parse_json_object, required_number, required_string,
};
pub use descriptor::{FunctionDescriptor, ParameterDescriptor, ParameterType};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::FunctionRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult};
