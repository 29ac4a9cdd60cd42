//! Tracing and metrics hooks for request, function and chat-turn phases.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeRequestHooks, TracingObservabilityHooks};
//!
//! let _request_hooks = SafeRequestHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeChatObserver, SafeRequestHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeChatObserver, SafeRequestHooks, SafeToolHooks,
        TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
