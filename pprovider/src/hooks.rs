//! Lifecycle hooks for streamed completion requests.
//!
//! ```rust
//! use pprovider::{NoopRequestHooks, RequestHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn RequestHooks) {}
//!
//! let hooks = NoopRequestHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use crate::{ChatRequest, RequestOutcome};

pub trait RequestHooks: Send + Sync {
    fn on_request_start(&self, _request: &ChatRequest) {}

    fn on_content_delta(&self, _delta: &str) {}

    fn on_function_call_started(&self, _name: &str) {}

    fn on_request_complete(&self, _outcome: &RequestOutcome, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRequestHooks;

impl RequestHooks for NoopRequestHooks {}
