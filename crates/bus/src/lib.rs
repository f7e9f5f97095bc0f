//! Lus Event Bus - In-process lifecycle notifications
//!
//! Terminal-state transitions (transaction completed/rejected/expired,
//! settlement approved/held/rejected/completed) are published here after
//! commit. Notification channels subscribe; the ledger never waits on them.

pub mod channel;
pub mod error;
pub mod event;
pub mod subscriber;

pub use channel::EventBus;
pub use error::{BusError, BusResult};
pub use event::LifecycleEvent;
pub use subscriber::NotificationSubscriber;
