//! Provider-agnostic chat request model types.
//!
//! ```rust
//! use pprovider::{ChatRequest, ProviderErrorKind, Role, WireMessage};
//!
//! let ok = ChatRequest::new("gpt-4o-mini", vec![WireMessage::new(Role::User, "Summarize this diff")])
//!     .with_temperature(0.4)
//!     .enable_streaming();
//! assert!(ok.validate().is_ok());
//!
//! let err = ChatRequest::new("", vec![WireMessage::new(Role::User, "hi")])
//!     .validate()
//!     .expect_err("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use pcommon::SamplingOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProviderError, WireMessage};

/// Function schema block sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub functions: Vec<FunctionDefinition>,
    pub sampling: SamplingOptions,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<WireMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            functions: Vec::new(),
            sampling: SamplingOptions::default(),
            stream: false,
        }
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.sampling.top_p = Some(top_p);
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if let Some(temperature) = self.sampling.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProviderError::invalid_request(
                    "temperature must be in the inclusive range 0.0..=2.0",
                ));
            }
        }

        if let Some(top_p) = self.sampling.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ProviderError::invalid_request(
                    "top_p must be in the inclusive range 0.0..=1.0",
                ));
            }
        }

        Ok(())
    }
}
