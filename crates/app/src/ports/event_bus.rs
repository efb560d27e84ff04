//! Event bus port — publish/subscribe for timer events.

use std::future::Future;

use blox_domain::error::BloxError;
use blox_domain::event::Event;

/// Publishes domain events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BloxError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BloxError>> + Send {
        (**self).publish(event)
    }
}
