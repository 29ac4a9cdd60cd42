//! Chat-completions HTTP payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};

use crate::{ChatRequest, FunctionDefinition, WireMessage};

pub(crate) fn build_api_request(request: ChatRequest) -> ApiRequest {
    ApiRequest {
        model: request.model,
        messages: request.messages,
        functions: if request.functions.is_empty() {
            None
        } else {
            Some(request.functions)
        },
        temperature: request.sampling.temperature,
        top_p: request.sampling.top_p,
        stream: true,
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub stream: bool,
}
