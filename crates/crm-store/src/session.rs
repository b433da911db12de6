//! The session store.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crm_core::client::Client;
use crm_core::history::{TransitionEvent, TransitionLog};
use crm_core::quote::{Quote, QuoteStatus};
use crm_core::request::{Request, RequestStatus};
use crm_core::stage::StageRegistry;
use crm_core::store::EntityStore;
use crm_core::PipelineResult;

use crate::broadcast::{BroadcastReceiver, BroadcastSender, StoreEvent};
use crate::error::StoreResult;
use crate::fixtures;
use crate::queries::{clients, quotes, requests};

/// Entity collections, stage registry and history for one session.
#[derive(Debug, Default)]
pub struct SessionStore {
    pub(crate) clients: Vec<Client>,
    pub(crate) requests: Vec<Request>,
    pub(crate) quotes: Vec<Quote>,
    pub(crate) stages: StageRegistry,
    pub(crate) history: TransitionLog,
    events: Option<BroadcastSender>,
}

impl SessionStore {
    pub fn new(
        clients: Vec<Client>,
        requests: Vec<Request>,
        quotes: Vec<Quote>,
        stages: StageRegistry,
    ) -> Self {
        Self {
            clients,
            requests,
            quotes,
            stages,
            history: TransitionLog::new(),
            events: None,
        }
    }

    /// A store seeded from the bundled datasets and the default stages.
    pub fn seeded() -> StoreResult<Self> {
        let dataset = fixtures::load()?;
        let history = fixtures::seed_history(&dataset);
        debug!(
            clients = dataset.clients.len(),
            requests = dataset.requests.len(),
            quotes = dataset.quotes.len(),
            "Seeded session store"
        );
        Ok(Self {
            clients: dataset.clients,
            requests: dataset.requests,
            quotes: dataset.quotes,
            stages: StageRegistry::with_defaults(),
            history,
            events: None,
        })
    }

    /// Publish change events on `tx`.
    pub fn with_broadcast(mut self, tx: BroadcastSender) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn subscribe(&self) -> Option<BroadcastReceiver> {
        self.events.as_ref().map(|tx| tx.subscribe())
    }

    /// Discard all session data and reseed. The broadcast channel survives.
    pub fn reset(&mut self) -> StoreResult<()> {
        let events = self.events.take();
        *self = Self::seeded()?;
        self.events = events;
        info!("Session reset");
        self.publish(StoreEvent::Reset);
        Ok(())
    }

    /// Edit the stage registry and notify observers.
    pub fn edit_stages<T>(&mut self, edit: impl FnOnce(&mut StageRegistry) -> T) -> T {
        let out = edit(&mut self.stages);
        self.publish(StoreEvent::StagesChanged);
        out
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        if let Some(tx) = &self.events {
            // No receivers is fine.
            let _ = tx.send(event);
        }
    }
}

impl EntityStore for SessionStore {
    fn clients(&self) -> &[Client] {
        &self.clients
    }

    fn requests(&self) -> &[Request] {
        &self.requests
    }

    fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    fn stages(&self) -> &StageRegistry {
        &self.stages
    }

    fn history(&self) -> &TransitionLog {
        &self.history
    }

    fn create_request(&mut self, request: Request) -> PipelineResult<()> {
        Ok(requests::create_request(self, request)?)
    }

    fn create_quote(&mut self, quote: Quote) -> PipelineResult<()> {
        Ok(quotes::create_quote(self, quote)?)
    }

    fn update_request_status(
        &mut self,
        request_id: &str,
        status: RequestStatus,
    ) -> PipelineResult<RequestStatus> {
        Ok(requests::update_request_status(self, request_id, status)?)
    }

    fn update_quote_status(
        &mut self,
        quote_id: &str,
        status: QuoteStatus,
        now: DateTime<Utc>,
    ) -> PipelineResult<QuoteStatus> {
        Ok(quotes::update_quote_status(self, quote_id, status, now)?)
    }

    fn activate_client(&mut self, client_id: &str, now: DateTime<Utc>) -> PipelineResult<bool> {
        Ok(clients::activate_client(self, client_id, now)?)
    }

    fn link_quote(&mut self, quote_id: &str, request_id: &str) -> PipelineResult<()> {
        Ok(quotes::link_quote(self, quote_id, request_id)?)
    }

    fn set_manual_stage(&mut self, request_id: &str, stage_id: Option<&str>) -> PipelineResult<()> {
        Ok(requests::set_manual_stage(self, request_id, stage_id)?)
    }

    fn record(&mut self, event: TransitionEvent) {
        self.history.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::create_broadcast_channel;

    #[test]
    fn test_seeded_store_has_default_stages() {
        let store = SessionStore::seeded().unwrap();
        assert_eq!(store.stages().stages(), StageRegistry::with_defaults().stages());
        assert!(!store.clients().is_empty());
        assert!(!store.history().is_empty());
    }

    #[test]
    fn test_reset_discards_session_changes() {
        let tx = create_broadcast_channel();
        let mut store = SessionStore::seeded().unwrap().with_broadcast(tx);
        let mut rx = store.subscribe().unwrap();

        let seeded_requests = store.requests().len();
        store.edit_stages(|stages| stages.add_stage("Site Visit").id.clone());
        store.requests.clear();

        store.reset().unwrap();
        assert_eq!(store.requests().len(), seeded_requests);
        assert!(!store.stages().contains("site-visit"));

        assert_eq!(rx.try_recv().unwrap(), StoreEvent::StagesChanged);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Reset);
        // Still wired after the reseed.
        assert!(store.subscribe().is_some());
    }
}
