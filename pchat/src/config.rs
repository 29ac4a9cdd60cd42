//! Conversation configuration supplied by the host.
//!
//! ```rust
//! use pchat::ChatConfig;
//!
//! let config = ChatConfig::new("gpt-3.5-turbo")
//!     .with_system_prompt("You are a concise coding assistant.")
//!     .with_max_history(6)
//!     .with_temperature(0.2);
//!
//! assert!(!config.supports_system_role());
//! assert!(config.validate().is_ok());
//! ```

use pcommon::SamplingOptions;
use serde::Deserialize;

use crate::ChatError;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_HISTORY: usize = 10;
pub const DEFAULT_ASSISTANT_NAME: &str = "Assistant";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Number of stored messages sent with each request, besides the synthesized prompt.
    pub max_history: usize,
    pub system_prompt: String,
    pub assistant_name: String,
    /// Whether the model accepts a dedicated system role; inferred from the model when unset.
    pub system_role: Option<bool>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            top_p: None,
            max_history: DEFAULT_MAX_HISTORY,
            system_prompt: String::new(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            system_role: None,
        }
    }
}

impl ChatConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_assistant_name(mut self, assistant_name: impl Into<String>) -> Self {
        self.assistant_name = assistant_name.into();
        self
    }

    pub fn with_system_role(mut self, system_role: bool) -> Self {
        self.system_role = Some(system_role);
        self
    }

    pub fn supports_system_role(&self) -> bool {
        self.system_role
            .unwrap_or_else(|| !self.model.starts_with("gpt-3.5"))
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::invalid_request("model must not be empty"));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ChatError::invalid_request(
                    "temperature must be in the inclusive range 0.0..=2.0",
                ));
            }
        }

        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ChatError::invalid_request(
                    "top_p must be in the inclusive range 0.0..=1.0",
                ));
            }
        }

        Ok(())
    }
}
