//! In-process event bus over a tokio broadcast channel

use crate::error::BusError;
use crate::event::LifecycleEvent;
use crate::subscriber::NotificationSubscriber;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of committed lifecycle events.
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<LifecycleEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every current receiver.
    ///
    /// Never fails: with no receivers the event is simply dropped.
    pub fn publish(&self, event: LifecycleEvent) {
        let name = event.name();
        match self.tx.send(Arc::new(event)) {
            Ok(receivers) => debug!(event = name, receivers, "event published"),
            Err(_) => debug!(event = name, "event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LifecycleEvent>> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Drive `subscriber` on its own task until the bus is dropped.
    ///
    /// Handler errors and lag are logged and skipped.
    pub fn spawn_subscriber(&self, subscriber: Arc<dyn NotificationSubscriber>) -> JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !subscriber.accepts(&event) {
                            continue;
                        }
                        if let Err(e) = subscriber.handle(&event).await {
                            warn!(subscriber = subscriber.name(), event = event.name(), error = %e, "notification failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(subscriber = subscriber.name(), error = %BusError::Lagged(skipped), "subscriber lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(subscriber = subscriber.name(), "bus closed");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSubscriber for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, event: &LifecycleEvent) -> Result<(), BusError> {
            self.seen.lock().unwrap().push(event.name().to_string());
            if self.fail {
                return Err(BusError::SubscriberFailed {
                    name: "recorder".into(),
                    reason: "smtp down".into(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = EventBus::new();
        bus.publish(LifecycleEvent::transaction_expired("LUS-AAAAAA", Utc::now()));
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order_despite_errors() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder { fail: true, ..Default::default() });
        let handle = bus.spawn_subscriber(recorder.clone());

        bus.publish(LifecycleEvent::transaction_expired("LUS-AAAAAA", Utc::now()));
        bus.publish(LifecycleEvent::transaction_expired("LUS-BBBBBB", Utc::now()));
        drop(bus);
        handle.await.unwrap();

        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }
}
