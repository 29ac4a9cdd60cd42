use std::future::Future;
use std::pin::Pin;

use crate::{ChatRequest, ChunkStream, ProviderError};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend that turns one chat request into a lazily consumed chunk stream.
///
/// The future resolves once the backend accepted the request. Dropping either the future or
/// the returned stream must release the underlying network operation.
pub trait CompletionTransport: Send + Sync + std::fmt::Debug {
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>>;
}
