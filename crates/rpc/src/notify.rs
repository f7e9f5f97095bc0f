//! Notification subscriber used by the CLI
//!
//! Stands in for the SMS/email layer: every lifecycle event is written to the
//! log as a structured record.

use async_trait::async_trait;
use lus_bus::{BusError, BusResult, LifecycleEvent, NotificationSubscriber};
use tracing::info;

#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSubscriber for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, event: &LifecycleEvent) -> BusResult<()> {
        let payload = serde_json::to_string(event).map_err(|e| BusError::SubscriberFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        info!(event = event.name(), %payload, "notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_handles_every_event() {
        let notifier = LogNotifier;
        let event = LifecycleEvent::transaction_expired("LUS-ABC123".to_string(), Utc::now());
        assert!(notifier.accepts(&event));
        notifier.handle(&event).await.unwrap();
    }
}
