//! Domain events and their distribution.
//!
//! Lifecycle transitions produce typed events; once the order has been
//! committed they are wrapped in an [`EventEnvelope`] and published on an
//! [`EventBus`] for downstream consumers (notifications, fulfillment, audit).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
