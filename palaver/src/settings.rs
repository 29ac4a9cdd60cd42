//! Host-supplied settings document: chat configuration, turn policy and backend selection.
//!
//! ```rust
//! use palaver::{BackendSettings, Settings};
//!
//! let settings = Settings::from_json_str(
//!     r#"{
//!         "chat": {"model": "gpt-4", "max_history": 6, "system_prompt": "Be brief."},
//!         "policy": {"max_chained_turns": 4},
//!         "backend": {"kind": "openai", "api_key": "sk-test"}
//!     }"#,
//! )
//! .expect("settings should parse");
//!
//! assert_eq!(settings.chat.max_history, 6);
//! assert_eq!(settings.policy.max_chained_turns, 4);
//! assert!(matches!(settings.backend, BackendSettings::OpenAi { .. }));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use pchat::{ChatConfig, ChatError, ChatPolicy};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsErrorKind {
    Parse,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsError {
    pub kind: SettingsErrorKind,
    pub message: String,
}

impl SettingsError {
    pub fn new(kind: SettingsErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(SettingsErrorKind::Parse, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(SettingsErrorKind::Invalid, message)
    }
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for SettingsError {}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::parse(value.to_string())
    }
}

impl From<SettingsError> for ChatError {
    fn from(value: SettingsError) -> Self {
        ChatError::invalid_request(value.message).with_cause(format!("{:?}", value.kind))
    }
}

/// Which chat-completions backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSettings {
    #[serde(rename = "openai")]
    OpenAi {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        organization: Option<String>,
    },
    Azure {
        api_key: String,
        deployment_url: String,
        #[serde(default)]
        api_version: Option<String>,
    },
}

impl BackendSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (api_key, url) = match self {
            Self::OpenAi {
                api_key, base_url, ..
            } => (api_key, base_url.as_deref()),
            Self::Azure {
                api_key,
                deployment_url,
                ..
            } => (api_key, Some(deployment_url.as_str())),
        };

        if api_key.trim().is_empty() {
            return Err(SettingsError::invalid("backend api_key must not be empty"));
        }

        if url.is_some_and(|url| url.trim().is_empty()) {
            return Err(SettingsError::invalid("backend url must not be empty"));
        }

        Ok(())
    }

    #[cfg(feature = "provider-openai")]
    pub fn to_auth(&self) -> pprovider::BackendAuth {
        use pprovider::BackendAuth;

        match self {
            Self::OpenAi {
                api_key,
                base_url,
                organization,
            } => {
                let mut auth = BackendAuth::openai(api_key.as_str());
                if let Some(base_url) = base_url {
                    auth = auth.with_base_url(base_url.clone());
                }
                if let Some(organization) = organization {
                    auth = auth.with_organization(organization.clone());
                }
                auth
            }
            Self::Azure {
                api_key,
                deployment_url,
                api_version,
            } => {
                let auth = BackendAuth::azure(api_key.as_str(), deployment_url.clone());
                match api_version {
                    Some(version) => auth.with_api_version(version.clone()),
                    None => auth,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub policy: ChatPolicy,
    pub backend: BackendSettings,
}

impl Settings {
    pub fn new(backend: BackendSettings) -> Self {
        Self {
            chat: ChatConfig::default(),
            policy: ChatPolicy::default(),
            backend,
        }
    }

    pub fn with_chat(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parses and validates a settings document.
    pub fn from_json_str(document: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(document)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.chat
            .validate()
            .map_err(|error| SettingsError::invalid(error.message))?;
        self.backend.validate()
    }
}
