//! Fire-and-forget notifications out of the engine.
//!
//! Hooks registered in [`EventHooks`] run on their own tasks. A slow or failing hook can never hold up, or roll back,
//! the fulfilment that raised the event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderPaidEvent, ReconciliationAlertEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
