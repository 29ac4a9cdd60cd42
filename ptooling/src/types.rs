//! Function execution context and result types.

use pcommon::{MessageId, MetadataMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    /// Id of the assistant message that requested the call.
    pub message_id: MessageId,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(message_id: impl Into<MessageId>) -> Self {
        Self {
            message_id: message_id.into(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionResult {
    pub function_name: String,
    pub output: String,
}

impl ToolExecutionResult {
    pub fn new(function_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            output: output.into(),
        }
    }
}
