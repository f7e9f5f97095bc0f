//! Notification errors
//!
//! None of these reach the publisher; they are logged by the subscriber task.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    /// A subscriber could not deliver a notification
    #[error("Subscriber '{name}' failed: {reason}")]
    SubscriberFailed { name: String, reason: String },

    /// A slow subscriber missed events
    #[error("Subscriber lagged behind, {0} events dropped")]
    Lagged(u64),
}

pub type BusResult<T> = Result<T, BusError>;
