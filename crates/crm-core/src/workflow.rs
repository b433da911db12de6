//! Workflow operations: user actions driven through an [`EntityStore`].
//!
//! Each operation writes entity state and history; stage membership is never
//! written, it is re-derived on the next read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backfill::{plan_backfill, BackfillStep};
use crate::client;
use crate::config::PipelineConfig;
use crate::deal::{derive_deals, Derivation, DeriveOptions};
use crate::error::{PipelineError, PipelineResult};
use crate::history::{TransitionEvent, TransitionKind};
use crate::quote::{self, Amount, Quote, QuoteStatus};
use crate::request::{self, Request, RequestSource, RequestStatus};
use crate::store::EntityStore;
use crate::validator;
use crate::verdict::Verdict;

/// Input of the quote form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuote {
    pub client_id: String,
    pub request_id: Option<String>,
    pub amount: f64,
    pub salesperson: Option<String>,
    pub notes: Option<String>,
}

/// Input of the request intake form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    pub client_id: String,
    pub title: String,
    pub service_details: String,
    pub notes: Option<String>,
}

/// Give every standalone quote a request. Returns how many quotes were
/// linked.
pub fn run_backfill<S: EntityStore>(store: &mut S) -> PipelineResult<usize> {
    let plan = plan_backfill(store.snapshot());
    for step in &plan {
        match step {
            BackfillStep::CreateAndLink { quote_id, request } => {
                debug!(quote_id = %quote_id, request_id = %request.id, "Creating request for standalone quote");
                let request_id = request.id.clone();
                store.create_request(request.clone())?;
                store.record(TransitionEvent::new(
                    &request_id,
                    TransitionKind::RequestStatus,
                    None,
                    request.status.as_str(),
                    request.requested_at,
                ));
                store.link_quote(quote_id, &request_id)?;
            }
            BackfillStep::Link { quote_id, request_id } => {
                debug!(quote_id = %quote_id, request_id = %request_id, "Linking quote to existing backfill request");
                store.link_quote(quote_id, request_id)?;
            }
        }
    }
    Ok(plan.len())
}

/// Backfill, derive the open pipeline and record stage entries for deals
/// whose stage changed since the last pass.
pub fn refresh<S: EntityStore>(
    store: &mut S,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> PipelineResult<Derivation> {
    run_backfill(store)?;
    let mut derivation = derive_deals(
        store.snapshot(),
        store.stages(),
        store.history(),
        DeriveOptions::open(config),
    )?;

    let mut entries = Vec::new();
    for deal in &mut derivation.deals {
        let Some(stage_id) = deal.stage_id() else {
            continue;
        };
        let previous = store.history().last_stage_entry(&deal.id).map(|e| e.to.clone());
        match previous {
            Some(ref prev) if prev == stage_id => {}
            Some(prev) => {
                entries.push(TransitionEvent::new(&deal.id, TransitionKind::Stage, Some(&prev), stage_id, now));
                deal.stage_entered_at = now;
            }
            // First sighting: the derived time is the best we know.
            None => entries.push(TransitionEvent::new(
                &deal.id,
                TransitionKind::Stage,
                None,
                stage_id,
                deal.stage_entered_at,
            )),
        }
    }
    if !entries.is_empty() {
        debug!(count = entries.len(), "Recording stage entries");
    }
    for entry in entries {
        store.record(entry);
    }
    Ok(derivation)
}

/// Open and closed deals, for the list view and reporting.
pub fn all_deals<S: EntityStore>(store: &mut S, config: &PipelineConfig) -> PipelineResult<Derivation> {
    run_backfill(store)?;
    derive_deals(
        store.snapshot(),
        store.stages(),
        store.history(),
        DeriveOptions::all(config),
    )
}

/// Change a quote's status. Winning a quote converts its request and
/// activates a lead client.
pub fn change_quote_status<S: EntityStore>(
    store: &mut S,
    quote_id: &str,
    status: QuoteStatus,
    now: DateTime<Utc>,
) -> PipelineResult<()> {
    let previous = store.update_quote_status(quote_id, status, now)?;
    if previous == status {
        return Ok(());
    }
    store.record(TransitionEvent::new(
        quote_id,
        TransitionKind::QuoteStatus,
        Some(previous.as_str()),
        status.as_str(),
        now,
    ));
    info!(quote_id = %quote_id, from = previous.as_str(), to = status.as_str(), "Quote status changed");

    if status.is_won() {
        let quote = quote::find(store.quotes(), quote_id)
            .cloned()
            .ok_or_else(|| PipelineError::QuoteNotFound(quote_id.to_string()))?;
        if let Some(request_id) = &quote.request_id {
            change_request_status(store, request_id, RequestStatus::Converted, now)?;
        }
        activate_client(store, &quote.client_id, now)?;
    }
    Ok(())
}

/// Change a request's status. Closing it as won activates a lead client.
pub fn change_request_status<S: EntityStore>(
    store: &mut S,
    request_id: &str,
    status: RequestStatus,
    now: DateTime<Utc>,
) -> PipelineResult<()> {
    let previous = store.update_request_status(request_id, status)?;
    if previous == status {
        return Ok(());
    }
    store.record(TransitionEvent::new(
        request_id,
        TransitionKind::RequestStatus,
        Some(previous.as_str()),
        status.as_str(),
        now,
    ));
    info!(request_id = %request_id, from = previous.as_str(), to = status.as_str(), "Request status changed");

    if matches!(status, RequestStatus::ClosedWon | RequestStatus::Converted) {
        let client_id = request::find(store.requests(), request_id)
            .map(|r| r.client_id.clone())
            .ok_or_else(|| PipelineError::RequestNotFound(request_id.to_string()))?;
        activate_client(store, &client_id, now)?;
    }
    Ok(())
}

fn activate_client<S: EntityStore>(store: &mut S, client_id: &str, now: DateTime<Utc>) -> PipelineResult<()> {
    if store.activate_client(client_id, now)? {
        info!(client_id = %client_id, "Client activated");
    }
    Ok(())
}

/// Create a draft quote from the quote form.
pub fn create_quote<S: EntityStore>(
    store: &mut S,
    input: NewQuote,
    now: DateTime<Utc>,
) -> PipelineResult<Quote> {
    let amount = Amount::new(input.amount)?;
    if client::find(store.clients(), &input.client_id).is_none() {
        return Err(PipelineError::ClientNotFound(input.client_id));
    }
    if let Some(request_id) = &input.request_id {
        let request = request::find(store.requests(), request_id)
            .ok_or_else(|| PipelineError::RequestNotFound(request_id.clone()))?;
        if request.client_id != input.client_id {
            return Err(PipelineError::store(format!(
                "request '{}' belongs to another client",
                request_id
            )));
        }
    }

    let quote = Quote {
        id: Uuid::new_v4().to_string(),
        client_id: input.client_id,
        request_id: input.request_id,
        quote_number: next_quote_number(store.quotes()),
        amount: amount.value(),
        status: QuoteStatus::Draft,
        created_at: now,
        sent_at: None,
        approved_at: None,
        converted_at: None,
        salesperson: input.salesperson,
        notes: input.notes,
    };
    store.create_quote(quote.clone())?;
    store.record(TransitionEvent::new(
        &quote.id,
        TransitionKind::QuoteStatus,
        None,
        quote.status.as_str(),
        now,
    ));
    info!(quote_id = %quote.id, quote_number = %quote.quote_number, "Quote created");
    Ok(quote)
}

/// One past the highest numeric quote number.
fn next_quote_number(quotes: &[Quote]) -> String {
    let highest = quotes
        .iter()
        .filter_map(|q| q.quote_number.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (highest + 1).to_string()
}

/// Create a request from the intake form.
pub fn create_request<S: EntityStore>(
    store: &mut S,
    input: NewRequest,
    now: DateTime<Utc>,
) -> PipelineResult<Request> {
    if client::find(store.clients(), &input.client_id).is_none() {
        return Err(PipelineError::ClientNotFound(input.client_id));
    }
    let request = Request {
        id: Uuid::new_v4().to_string(),
        client_id: input.client_id,
        title: input.title,
        service_details: input.service_details,
        requested_at: now,
        status: RequestStatus::New,
        notes: input.notes,
        source: RequestSource::Intake,
        manual_stage: None,
    };
    store.create_request(request.clone())?;
    store.record(TransitionEvent::new(
        &request.id,
        TransitionKind::RequestStatus,
        None,
        request.status.as_str(),
        now,
    ));
    info!(request_id = %request.id, "Request created");
    Ok(request)
}

/// Drag a deal to another stage. The guards run against the deal's current
/// stage; when they allow the move, the target is stored as the request's
/// placement and the next derivation puts the deal there.
pub fn move_deal<S: EntityStore>(
    store: &mut S,
    config: &PipelineConfig,
    deal_id: &str,
    target_stage: &str,
    now: DateTime<Utc>,
) -> PipelineResult<Verdict> {
    let derivation = refresh(store, config, now)?;
    let current = derivation
        .deals
        .iter()
        .find(|d| d.id == deal_id)
        .and_then(|d| d.stage_id().map(str::to_string))
        .ok_or_else(|| PipelineError::RequestNotFound(deal_id.to_string()))?;

    let verdict = validator::can_move(store.stages(), &current, target_stage);
    if !verdict.is_allowed() {
        debug!(deal_id = %deal_id, from = %current, to = %target_stage, "Move rejected");
        return Ok(verdict);
    }
    if current != target_stage {
        store.set_manual_stage(deal_id, Some(target_stage))?;
        info!(deal_id = %deal_id, from = %current, to = %target_stage, "Deal moved");
    }
    Ok(verdict)
}
