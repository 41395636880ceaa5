use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted after a state change has been committed. Consumers must
/// never assume an event implies an uncommitted change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Item events
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),

    // Stock ledger events
    StockApplied {
        item_id: Uuid,
        transaction_id: i64,
        kind: String,
        previous_quantity: i32,
        new_quantity: i32,
    },
    LowStock {
        item_id: Uuid,
        quantity: i32,
        min_stock_level: i32,
    },

    // Request lifecycle events
    RequestSubmitted(Uuid),
    RequestApproved {
        request_id: Uuid,
        approver: Uuid,
    },
    RequestRejected {
        request_id: Uuid,
        approver: Uuid,
    },
    RequestFulfilled {
        request_id: Uuid,
        lines: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. Runs until every sender
/// has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockApplied {
                item_id,
                transaction_id,
                kind,
                previous_quantity,
                new_quantity,
            } => {
                info!(
                    %item_id,
                    transaction_id,
                    kind,
                    previous_quantity,
                    new_quantity,
                    "stock transaction applied"
                );
            }
            Event::LowStock {
                item_id,
                quantity,
                min_stock_level,
            } => {
                warn!(
                    %item_id,
                    quantity,
                    min_stock_level,
                    "item at or below minimum stock level"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop terminated");
}
