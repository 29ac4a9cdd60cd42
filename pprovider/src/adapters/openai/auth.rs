//! Backend authentication for OpenAI and Azure OpenAI deployments.

use crate::{ProviderError, SecretString};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const AZURE_DEFAULT_API_VERSION: &str = "2023-03-15-preview";

const COMPLETIONS_PATH: &str = "chat/completions";

/// How requests reach the chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAuth {
    /// Bearer-token auth against the public API or a compatible proxy.
    OpenAi {
        api_key: SecretString,
        base_url: String,
        organization: Option<String>,
    },
    /// `api-key` header auth against one Azure deployment.
    Azure {
        api_key: SecretString,
        deployment_url: String,
        api_version: String,
    },
}

impl BackendAuth {
    pub fn openai(api_key: impl Into<SecretString>) -> Self {
        Self::OpenAi {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            organization: None,
        }
    }

    pub fn azure(api_key: impl Into<SecretString>, deployment_url: impl Into<String>) -> Self {
        Self::Azure {
            api_key: api_key.into(),
            deployment_url: deployment_url.into(),
            api_version: AZURE_DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Overrides the base URL; Azure deployments keep their deployment URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Self::OpenAi { base_url, .. } = &mut self {
            *base_url = url.into();
        }
        self
    }

    pub fn with_organization(mut self, value: impl Into<String>) -> Self {
        if let Self::OpenAi { organization, .. } = &mut self {
            *organization = Some(value.into());
        }
        self
    }

    pub fn with_api_version(mut self, value: impl Into<String>) -> Self {
        if let Self::Azure { api_version, .. } = &mut self {
            *api_version = value.into();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        let (api_key, url) = match self {
            Self::OpenAi {
                api_key, base_url, ..
            } => (api_key, base_url),
            Self::Azure {
                api_key,
                deployment_url,
                ..
            } => (api_key, deployment_url),
        };

        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        if url.trim().is_empty() {
            return Err(ProviderError::invalid_request(
                "backend url must not be empty",
            ));
        }

        Ok(())
    }

    pub fn endpoint(&self) -> String {
        match self {
            Self::OpenAi { base_url, .. } => {
                format!("{}/{COMPLETIONS_PATH}", base_url.trim_end_matches('/'))
            }
            Self::Azure {
                deployment_url,
                api_version,
                ..
            } => format!(
                "{}/{COMPLETIONS_PATH}?api-version={api_version}",
                deployment_url.trim_end_matches('/')
            ),
        }
    }

    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::OpenAi {
                api_key,
                organization,
                ..
            } => {
                let builder = builder.bearer_auth(api_key.expose());
                match organization {
                    Some(organization) => builder.header("OpenAI-Organization", organization),
                    None => builder,
                }
            }
            Self::Azure { api_key, .. } => builder.header("api-key", api_key.expose()),
        }
    }
}
