use tokio::sync::broadcast;

use super::types::TranslationEvent;

/// Fan-out of [`TranslationEvent`]s to whoever is listening. Cloning the bus
/// shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TranslationEvent>,
}

impl EventBus {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Returns how many subscribers the event reached; zero is not an error.
    pub fn publish(&self, event: TranslationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{CreationMode, TranslationCreated};

    fn created(id: &str, mode: CreationMode) -> TranslationEvent {
        TranslationEvent::Created(TranslationCreated {
            document_id: id.to_string(),
            document_type: "page".to_string(),
            translation_id: "t1".to_string(),
            language: "fr".to_string(),
            mode,
            timestamp: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::new(8);
        let mut studio = bus.subscribe();
        let mut audit = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(created("drafts.x", CreationMode::Duplicate)), 2);

        for rx in [&mut studio, &mut audit] {
            let TranslationEvent::Created(event) = rx.recv().await.unwrap();
            assert_eq!(event.document_id, "drafts.x");
        }
    }

    #[test]
    fn nobody_listening() {
        let bus = EventBus::new(0);
        assert_eq!(bus.publish(created("drafts.z", CreationMode::Fresh)), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(created("drafts.a", CreationMode::Fresh));
        bus.publish(created("drafts.b", CreationMode::Fresh));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        let TranslationEvent::Created(event) = rx.recv().await.unwrap();
        assert_eq!(event.document_id, "drafts.b");
    }

    #[test]
    fn event_wire_format() {
        let value = serde_json::to_value(created("drafts.x", CreationMode::Duplicate)).unwrap();
        assert_eq!(value["type"], "created");
        assert_eq!(value["documentId"], "drafts.x");
        assert_eq!(value["translationId"], "t1");
        assert_eq!(value["mode"], "duplicate");
    }
}
