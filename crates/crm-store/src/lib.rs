//! CRM Session Store
//!
//! In-memory entity stores for one session: clients, requests, quotes, the
//! stage registry and the transition history. Seeded from the bundled
//! fixture datasets and discarded on reset.

pub mod broadcast;
pub mod error;
pub mod fixtures;
pub mod queries;
pub mod session;

pub use broadcast::{create_broadcast_channel, BroadcastReceiver, BroadcastSender, StoreEvent};
pub use error::{StoreError, StoreResult};
pub use queries::clients;
pub use queries::quotes;
pub use queries::requests;
pub use session::SessionStore;

#[cfg(test)]
mod scenarios;
