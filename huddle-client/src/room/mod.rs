mod events;

pub use events::{EventRouter, EventSubscription};
