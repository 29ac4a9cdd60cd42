//! reqwest-based chat-completions transport with server-sent-event decoding.

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};

use crate::{
    ChatRequest, ChunkStream, CompletionChunk, CompletionTransport, ProviderError,
    ProviderFuture,
};

use super::auth::BackendAuth;
use super::serde_api::{build_api_request, extract_error_message};

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    auth: BackendAuth,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client, auth: BackendAuth) -> Self {
        Self { client, auth }
    }

    pub fn auth(&self) -> &BackendAuth {
        &self.auth
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("completion request failed with status {status}"));

        status_error(status, message)
    }
}

pub(crate) fn status_error(status: StatusCode, message: String) -> ProviderError {
    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            ProviderError::unavailable(message)
        }
        _ => ProviderError::transport(message),
    };

    error.with_cause(format!("http status {}", status.as_u16()))
}

fn send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout("completion request timed out").with_cause(err)
    } else {
        ProviderError::transport("completion request failed").with_cause(err)
    }
}

impl CompletionTransport for OpenAiHttpTransport {
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.auth.validate()?;
            let api_request = build_api_request(request);
            let builder = self
                .client
                .post(self.auth.endpoint())
                .header("Accept", "text/event-stream")
                .json(&api_request);
            let response = self.auth.apply(builder).send().await.map_err(send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut decoder = SseDecoder::default();

                'read: while let Some(item) = bytes.next().await {
                    let item = item.map_err(|err| {
                        ProviderError::transport("completion stream failed").with_cause(err)
                    })?;

                    for event in decoder.push(&item)? {
                        match event {
                            SseEvent::Chunk(chunk) => yield chunk,
                            SseEvent::Done => break 'read,
                        }
                    }
                }

                if let Some(SseEvent::Chunk(chunk)) = decoder.finish()? {
                    yield chunk;
                }
            };

            Ok(Box::pin(stream) as ChunkStream<'a>)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    Chunk(CompletionChunk),
    Done,
}

/// Incremental `text/event-stream` decoder for `data:` lines.
///
/// Bytes are buffered until a full line is available, so multi-byte characters split across
/// network reads decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, ProviderError> {
        let mut events = Vec::new();
        if self.done {
            return Ok(events);
        }

        self.buffer.extend_from_slice(bytes);
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            if let Some(event) = self.decode_line(&line)? {
                events.push(event);
                if self.done {
                    break;
                }
            }
        }

        Ok(events)
    }

    /// Decodes a last line the server sent without a trailing newline.
    pub(crate) fn finish(&mut self) -> Result<Option<SseEvent>, ProviderError> {
        if self.done || self.buffer.is_empty() {
            return Ok(None);
        }

        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    fn decode_line(&mut self, line: &[u8]) -> Result<Option<SseEvent>, ProviderError> {
        let line = std::str::from_utf8(line).map_err(|err| {
            ProviderError::protocol_violation("event stream line is not valid utf-8")
                .with_cause(err)
        })?;

        let Some(payload) = line.trim().strip_prefix("data:") else {
            return Ok(None);
        };

        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            return Ok(Some(SseEvent::Done));
        }

        let chunk = serde_json::from_str::<CompletionChunk>(payload).map_err(|err| {
            ProviderError::protocol_violation("event stream payload is not a completion chunk")
                .with_cause(err)
        })?;
        Ok(Some(SseEvent::Chunk(chunk)))
    }
}
