//! Change notifications for session observers.
//!
//! The store publishes an event after every write. Observers are passive;
//! a send with no subscribers is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Store change events.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    ClientUpdated { client_id: String, status: String },
    RequestCreated { request_id: String },
    RequestUpdated { request_id: String, status: String },
    QuoteCreated { quote_id: String },
    QuoteUpdated { quote_id: String, status: String },
    QuoteLinked { quote_id: String, request_id: String },
    DealPlaced { request_id: String, stage_id: Option<String> },
    StagesChanged,
    /// The session was discarded and reseeded.
    Reset,
}

pub type BroadcastSender = broadcast::Sender<StoreEvent>;

pub type BroadcastReceiver = broadcast::Receiver<StoreEvent>;

/// Create a new broadcast channel with default capacity.
pub fn create_broadcast_channel() -> BroadcastSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}
