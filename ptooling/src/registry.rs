//! Name-keyed function catalog.
//!
//! ```rust
//! use ptooling::{FunctionDescriptor, FunctionRegistry, ToolErrorKind};
//!
//! let mut registry = FunctionRegistry::new();
//! registry
//!     .register_sync_fn(FunctionDescriptor::new("getTime"), |_args, _ctx| Ok("12:00".to_string()))
//!     .expect("first registration succeeds");
//!
//! let duplicate = registry
//!     .register_sync_fn(FunctionDescriptor::new("getTime"), |_args, _ctx| Ok("13:00".to_string()))
//!     .expect_err("names are unique");
//! assert_eq!(duplicate.kind, ToolErrorKind::DuplicateName);
//! assert_eq!(registry.definitions().len(), 1);
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::Registry;
use pprovider::FunctionDefinition;
use serde_json::Value;

use crate::{FunctionDescriptor, FunctionTool, Tool, ToolError, ToolExecutionContext};

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: Registry<String, Arc<dyn Tool>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tool` under its descriptor name; an existing entry is left untouched on conflict.
    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolError>
    where
        T: Tool + 'static,
    {
        self.register_shared(Arc::new(tool))
    }

    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.descriptor().name.clone();
        if name.trim().is_empty() {
            return Err(ToolError::invalid_arguments("function name must not be empty"));
        }

        if self.functions.contains_key(&name) {
            return Err(ToolError::duplicate_name(&name));
        }

        self.functions.insert(name, tool);
        Ok(())
    }

    pub fn register_fn<F, Fut>(
        &mut self,
        descriptor: FunctionDescriptor,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(descriptor, handler))
    }

    pub fn register_sync_fn<F>(
        &mut self,
        descriptor: FunctionDescriptor,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(Value, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register(FunctionTool::from_sync(descriptor, handler))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns `false` when no function is registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Wire schema blocks in registration order.
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions
            .values()
            .map(|tool| tool.descriptor().to_definition())
            .collect()
    }

    pub fn status_message(&self, name: &str) -> Option<String> {
        self.functions
            .get(name)
            .and_then(|tool| tool.descriptor().status_message.clone())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
