//! Standalone-quote backfill.
//!
//! Every deal maps to a request, so a quote created without one gets a
//! minimal synthetic request. Planning is pure; applying the plan is a
//! two-step write (create the request, then link the quote), and a
//! half-applied plan is finished by the next pass.

use tracing::debug;

use crate::client;
use crate::request::{self, backfill_request_id, Request};
use crate::store::Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum BackfillStep {
    /// Create the synthetic request, then link the quote to it.
    CreateAndLink { quote_id: String, request: Request },
    /// The synthetic request exists already; only the link is missing.
    Link { quote_id: String, request_id: String },
}

impl BackfillStep {
    pub fn quote_id(&self) -> &str {
        match self {
            Self::CreateAndLink { quote_id, .. } | Self::Link { quote_id, .. } => quote_id,
        }
    }
}

/// Steps needed to give every standalone quote a request.
pub fn plan_backfill(snapshot: Snapshot<'_>) -> Vec<BackfillStep> {
    snapshot
        .quotes
        .iter()
        .filter(|q| q.is_standalone())
        .filter_map(|q| {
            if client::find(snapshot.clients, &q.client_id).is_none() {
                debug!(quote_id = %q.id, "Not backfilling quote with missing client");
                return None;
            }
            let request_id = backfill_request_id(&q.id);
            let step = if request::find(snapshot.requests, &request_id).is_some() {
                BackfillStep::Link {
                    quote_id: q.id.clone(),
                    request_id,
                }
            } else {
                BackfillStep::CreateAndLink {
                    quote_id: q.id.clone(),
                    request: Request::backfill_for(q),
                }
            };
            Some(step)
        })
        .collect()
}
