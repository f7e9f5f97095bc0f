//! Notification subscriber trait

use crate::error::BusResult;
use crate::event::LifecycleEvent;
use async_trait::async_trait;

/// Receives lifecycle events from the bus (SMS, email, push...).
///
/// Delivery is at-most-once and best effort; a failing subscriber never
/// affects the ledger.
#[async_trait]
pub trait NotificationSubscriber: Send + Sync {
    /// Subscriber name (for logging)
    fn name(&self) -> &str;

    async fn handle(&self, event: &LifecycleEvent) -> BusResult<()>;

    /// Whether this subscriber wants the event at all
    fn accepts(&self, _event: &LifecycleEvent) -> bool {
        true
    }
}
