//! Chat event observers.
//!
//! ```rust
//! use futures_util::StreamExt;
//! use pchat::{ChatEvent, ChatObserver, channel_observer};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let (observer, mut events) = channel_observer();
//! observer.on_event(&ChatEvent::HistoryCleared);
//! drop(observer);
//!
//! assert_eq!(events.next().await, Some(ChatEvent::HistoryCleared));
//! assert_eq!(events.next().await, None);
//! # });
//! ```

use std::sync::Arc;

use async_stream::stream;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::{ChatEvent, ChatEventStream};

/// Receives every chat event synchronously, in emission order.
///
/// Implementations must not call back into the service that emits the event.
pub trait ChatObserver: Send + Sync {
    fn on_event(&self, _event: &ChatEvent) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatObserver;

impl ChatObserver for NoopChatObserver {}

/// Forwards each event to every inner observer in registration order.
#[derive(Default, Clone)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn ChatObserver>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Arc<dyn ChatObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn ChatObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ChatObserver for FanoutObserver {
    fn on_event(&self, event: &ChatEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelChatObserver {
    sender: UnboundedSender<ChatEvent>,
}

impl ChatObserver for ChannelChatObserver {
    fn on_event(&self, event: &ChatEvent) {
        let _ = self.sender.send(event.clone());
    }
}

/// Pairs an observer with the stream of events it receives.
///
/// The stream ends once every clone of the observer is dropped.
pub fn channel_observer() -> (ChannelChatObserver, ChatEventStream<'static>) {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let events = stream! {
        while let Some(event) = receiver.recv().await {
            yield event;
        }
    };

    (ChannelChatObserver { sender }, Box::pin(events))
}
