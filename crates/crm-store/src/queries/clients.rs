//! Client queries.

use chrono::{DateTime, Utc};

use crm_core::client::{Client, ClientStatus};

use crate::broadcast::StoreEvent;
use crate::error::{StoreError, StoreResult};
use crate::session::SessionStore;

pub fn get_client<'a>(store: &'a SessionStore, client_id: &str) -> StoreResult<&'a Client> {
    store
        .clients
        .iter()
        .find(|c| c.id == client_id)
        .ok_or_else(|| StoreError::not_found("client", client_id))
}

pub fn list_clients(store: &SessionStore) -> &[Client] {
    &store.clients
}

pub fn list_clients_by_status(store: &SessionStore, status: ClientStatus) -> Vec<&Client> {
    store.clients.iter().filter(|c| c.status == status).collect()
}

/// Promote a lead client to active. Returns whether the status changed.
pub fn activate_client(
    store: &mut SessionStore,
    client_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    let client = store
        .clients
        .iter_mut()
        .find(|c| c.id == client_id)
        .ok_or_else(|| StoreError::not_found("client", client_id))?;
    if !client.activate(now) {
        return Ok(false);
    }
    let event = StoreEvent::ClientUpdated {
        client_id: client.id.clone(),
        status: client.status.as_str().to_string(),
    };
    store.publish(event);
    Ok(true)
}
