//! The entity-store seam.
//!
//! The engine reads plain snapshots and requests every mutation through
//! [`EntityStore`]; it never owns the collections itself.

use chrono::{DateTime, Utc};

use crate::client::Client;
use crate::error::PipelineResult;
use crate::history::{TransitionEvent, TransitionLog};
use crate::quote::{Quote, QuoteStatus};
use crate::request::{Request, RequestStatus};
use crate::stage::StageRegistry;

/// Read-only view of the three entity collections at one point in time.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub clients: &'a [Client],
    pub requests: &'a [Request],
    pub quotes: &'a [Quote],
}

/// Storage collaborator the workflow operations write through.
pub trait EntityStore {
    fn clients(&self) -> &[Client];
    fn requests(&self) -> &[Request];
    fn quotes(&self) -> &[Quote];
    fn stages(&self) -> &StageRegistry;
    fn history(&self) -> &TransitionLog;

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            clients: self.clients(),
            requests: self.requests(),
            quotes: self.quotes(),
        }
    }

    fn create_request(&mut self, request: Request) -> PipelineResult<()>;

    fn create_quote(&mut self, quote: Quote) -> PipelineResult<()>;

    /// Set a request's status, returning the previous one.
    fn update_request_status(
        &mut self,
        request_id: &str,
        status: RequestStatus,
    ) -> PipelineResult<RequestStatus>;

    /// Set a quote's status, stamping its milestone timestamps. Returns the
    /// previous status.
    fn update_quote_status(
        &mut self,
        quote_id: &str,
        status: QuoteStatus,
        now: DateTime<Utc>,
    ) -> PipelineResult<QuoteStatus>;

    /// Promote a lead client to active. Returns whether anything changed.
    fn activate_client(&mut self, client_id: &str, now: DateTime<Utc>) -> PipelineResult<bool>;

    /// Point a quote at its request.
    fn link_quote(&mut self, quote_id: &str, request_id: &str) -> PipelineResult<()>;

    fn set_manual_stage(&mut self, request_id: &str, stage_id: Option<&str>) -> PipelineResult<()>;

    /// Append to the transition history.
    fn record(&mut self, event: TransitionEvent);
}
