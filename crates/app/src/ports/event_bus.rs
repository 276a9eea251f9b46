//! Event bus port: publish/subscribe for controller events.

use std::future::Future;

use flowmate_domain::error::FlowMateError;
use flowmate_domain::event::Event;

/// Publishes events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), FlowMateError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), FlowMateError>> + Send {
        (**self).publish(event)
    }
}
