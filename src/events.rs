use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events published by commands. Consumers subscribe through the
/// channel handed to [`process_events`]; teardown is the receiver being
/// dropped, which closes the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Document lifecycle
    DocumentCreated {
        document_id: Uuid,
        document_number: String,
    },
    DocumentUpdated(Uuid),
    DocumentConfirmed {
        document_id: Uuid,
        movements_emitted: bool,
    },
    DocumentCancelled(Uuid),
    DocumentDeleted(Uuid),

    // Document lines
    DocumentLineAdded {
        document_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    DocumentLineUpdated {
        document_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    DocumentLineRemoved {
        document_id: Uuid,
        product_id: Uuid,
    },

    // Signature gate
    SignaturesCompleted(Uuid),
    StockMovementsEmitted {
        document_id: Uuid,
        movement_count: usize,
    },

    // Material movements
    MaterialMovementRecorded {
        movement_id: Uuid,
        event_id: Uuid,
        movement_type: String,
        total: Decimal,
    },
}

/// Cloneable handle for publishing events onto the bounded channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Runs until every
/// `EventSender` clone is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
    info!("event channel closed, processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::DocumentCancelled(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::DocumentCancelled(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::DocumentDeleted(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
