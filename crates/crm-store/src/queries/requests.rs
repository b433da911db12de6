//! Request queries.

use tracing::debug;

use crm_core::request::{Request, RequestStatus};

use crate::broadcast::StoreEvent;
use crate::error::{StoreError, StoreResult};
use crate::session::SessionStore;

pub fn get_request<'a>(store: &'a SessionStore, request_id: &str) -> StoreResult<&'a Request> {
    store
        .requests
        .iter()
        .find(|r| r.id == request_id)
        .ok_or_else(|| StoreError::not_found("request", request_id))
}

fn get_request_mut<'a>(store: &'a mut SessionStore, request_id: &str) -> StoreResult<&'a mut Request> {
    store
        .requests
        .iter_mut()
        .find(|r| r.id == request_id)
        .ok_or_else(|| StoreError::not_found("request", request_id))
}

pub fn list_requests_for_client<'a>(store: &'a SessionStore, client_id: &str) -> Vec<&'a Request> {
    store
        .requests
        .iter()
        .filter(|r| r.client_id == client_id)
        .collect()
}

pub fn create_request(store: &mut SessionStore, request: Request) -> StoreResult<()> {
    if get_request(store, &request.id).is_ok() {
        return Err(StoreError::duplicate("request", &request.id));
    }
    debug!(request_id = %request.id, client_id = %request.client_id, "Creating request");
    let event = StoreEvent::RequestCreated {
        request_id: request.id.clone(),
    };
    store.requests.push(request);
    store.publish(event);
    Ok(())
}

/// Set a request's status, returning the previous one.
pub fn update_request_status(
    store: &mut SessionStore,
    request_id: &str,
    status: RequestStatus,
) -> StoreResult<RequestStatus> {
    let request = get_request_mut(store, request_id)?;
    let previous = std::mem::replace(&mut request.status, status);
    store.publish(StoreEvent::RequestUpdated {
        request_id: request_id.to_string(),
        status: status.as_str().to_string(),
    });
    Ok(previous)
}

pub fn set_manual_stage(
    store: &mut SessionStore,
    request_id: &str,
    stage_id: Option<&str>,
) -> StoreResult<()> {
    let request = get_request_mut(store, request_id)?;
    request.manual_stage = stage_id.map(str::to_string);
    store.publish(StoreEvent::DealPlaced {
        request_id: request_id.to_string(),
        stage_id: stage_id.map(str::to_string),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::create_broadcast_channel;

    #[test]
    fn test_update_request_status_returns_previous() {
        let tx = create_broadcast_channel();
        let mut store = SessionStore::seeded().unwrap().with_broadcast(tx);
        let mut rx = store.subscribe().unwrap();

        let previous = update_request_status(&mut store, "req-1003", RequestStatus::Unscheduled).unwrap();
        assert_eq!(previous, RequestStatus::New);
        assert_eq!(
            get_request(&store, "req-1003").unwrap().status,
            RequestStatus::Unscheduled
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::RequestUpdated {
                request_id: "req-1003".to_string(),
                status: "unscheduled".to_string()
            }
        );
    }

    #[test]
    fn test_missing_request_is_not_found() {
        let mut store = SessionStore::seeded().unwrap();
        let err = set_manual_stage(&mut store, "req-missing", Some("contacted")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "request", .. }));
    }

    #[test]
    fn test_list_requests_for_client() {
        let store = SessionStore::seeded().unwrap();
        let ids: Vec<&str> = list_requests_for_client(&store, "cl-1001")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["req-1001", "req-1011"]);
    }
}
