//! Quote queries.

use chrono::{DateTime, Utc};
use tracing::debug;

use crm_core::quote::{Quote, QuoteStatus};

use crate::broadcast::StoreEvent;
use crate::error::{StoreError, StoreResult};
use crate::queries::requests;
use crate::session::SessionStore;

pub fn get_quote<'a>(store: &'a SessionStore, quote_id: &str) -> StoreResult<&'a Quote> {
    store
        .quotes
        .iter()
        .find(|q| q.id == quote_id)
        .ok_or_else(|| StoreError::not_found("quote", quote_id))
}

fn get_quote_mut<'a>(store: &'a mut SessionStore, quote_id: &str) -> StoreResult<&'a mut Quote> {
    store
        .quotes
        .iter_mut()
        .find(|q| q.id == quote_id)
        .ok_or_else(|| StoreError::not_found("quote", quote_id))
}

pub fn list_quotes_for_request<'a>(store: &'a SessionStore, request_id: &str) -> Vec<&'a Quote> {
    store
        .quotes
        .iter()
        .filter(|q| q.request_id.as_deref() == Some(request_id))
        .collect()
}

pub fn create_quote(store: &mut SessionStore, quote: Quote) -> StoreResult<()> {
    if get_quote(store, &quote.id).is_ok() {
        return Err(StoreError::duplicate("quote", &quote.id));
    }
    debug!(quote_id = %quote.id, client_id = %quote.client_id, "Creating quote");
    let event = StoreEvent::QuoteCreated {
        quote_id: quote.id.clone(),
    };
    store.quotes.push(quote);
    store.publish(event);
    Ok(())
}

/// Set a quote's status, stamping its milestone timestamps. Returns the
/// previous status.
pub fn update_quote_status(
    store: &mut SessionStore,
    quote_id: &str,
    status: QuoteStatus,
    now: DateTime<Utc>,
) -> StoreResult<QuoteStatus> {
    let previous = get_quote_mut(store, quote_id)?.transition(status, now);
    store.publish(StoreEvent::QuoteUpdated {
        quote_id: quote_id.to_string(),
        status: status.as_str().to_string(),
    });
    Ok(previous)
}

pub fn link_quote(store: &mut SessionStore, quote_id: &str, request_id: &str) -> StoreResult<()> {
    requests::get_request(store, request_id)?;
    get_quote_mut(store, quote_id)?.request_id = Some(request_id.to_string());
    store.publish(StoreEvent::QuoteLinked {
        quote_id: quote_id.to_string(),
        request_id: request_id.to_string(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_quote_status_stamps_once() {
        let mut store = SessionStore::seeded().unwrap();
        let first = Utc::now();
        let previous = update_quote_status(&mut store, "q-2001", QuoteStatus::AwaitingResponse, first).unwrap();
        assert_eq!(previous, QuoteStatus::Draft);

        let later = first + chrono::Duration::days(1);
        update_quote_status(&mut store, "q-2001", QuoteStatus::ChangesRequested, later).unwrap();
        update_quote_status(&mut store, "q-2001", QuoteStatus::AwaitingResponse, later).unwrap();
        assert_eq!(get_quote(&store, "q-2001").unwrap().sent_at, Some(first));
    }

    #[test]
    fn test_link_quote_requires_request() {
        let mut store = SessionStore::seeded().unwrap();
        let err = link_quote(&mut store, "q-2002", "req-missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "request", .. }));
        assert!(get_quote(&store, "q-2002").unwrap().request_id.is_none());

        link_quote(&mut store, "q-2002", "req-1006").unwrap();
        let linked = list_quotes_for_request(&store, "req-1006");
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, "q-2002");
    }
}
