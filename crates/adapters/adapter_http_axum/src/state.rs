//! Shared application state for axum handlers.

use std::sync::Arc;

use flowmate_app::event_bus::InProcessEventBus;
use flowmate_app::ports::ControlPort;

/// Application state shared across all axum handlers.
///
/// Generic over the control port to avoid dynamic dispatch. `Clone` is
/// implemented manually so `C` itself does not need to be `Clone`.
pub struct AppState<C> {
    /// The controller commands are forwarded to.
    pub control: Arc<C>,
    /// Bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<C> AppState<C>
where
    C: ControlPort + Send + Sync + 'static,
{
    /// Create the state from a shared controller and event bus.
    pub fn new(control: Arc<C>, event_bus: Arc<InProcessEventBus>) -> Self {
        Self { control, event_bus }
    }
}
