//! Streaming chunk contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{ChunkStream, CompletionChunk, VecChunkStream};
//!
//! let stream = VecChunkStream::new(vec![Ok(CompletionChunk::content("hello"))]);
//! let _boxed: ChunkStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::{Deserialize, Deserializer};

use crate::ProviderError;

/// One incremental unit of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl CompletionChunk {
    pub fn new(choice: ChunkChoice) -> Self {
        Self {
            choices: vec![choice],
        }
    }

    pub fn content(delta: impl Into<String>) -> Self {
        Self::new(ChunkChoice {
            delta: ChunkDelta {
                content: Some(delta.into()),
                function_call: None,
            },
            finish_reason: None,
        })
    }

    pub fn function_call(name: Option<&str>, arguments: Option<&str>) -> Self {
        Self::new(ChunkChoice {
            delta: ChunkDelta {
                content: None,
                function_call: Some(FunctionCallDelta {
                    name: name.map(ToString::to_string),
                    arguments: arguments.map(ToString::to_string),
                }),
            },
            finish_reason: None,
        })
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self::new(ChunkChoice {
            delta: ChunkDelta::default(),
            finish_reason: Some(reason),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCallDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FunctionCallDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    FunctionCall,
    Other(String),
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "function_call" => Self::FunctionCall,
            other => Self::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Transport chunk stream.
///
/// Chunks are yielded in the order the backend produced them. Dropping the stream
/// releases the underlying network resource.
pub type ChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<CompletionChunk, ProviderError>> + Send + 'a>>;

#[derive(Debug)]
pub struct VecChunkStream {
    chunks: VecDeque<Result<CompletionChunk, ProviderError>>,
}

impl VecChunkStream {
    pub fn new(chunks: Vec<Result<CompletionChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Stream for VecChunkStream {
    type Item = Result<CompletionChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<CompletionChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
