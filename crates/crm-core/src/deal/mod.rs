//! Deal derivation.
//!
//! Turns the client, request and quote collections into the list of deals
//! shown on the pipeline. The pass is a pure function of its inputs: the same
//! snapshot, registry and history always produce the same deals.

pub mod model;

pub use model::{ClosedOutcome, Deal, DealKind, Derivation, Orphan, Placement};

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::client::{self, Client};
use crate::config::{OrphanPolicy, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::history::TransitionLog;
use crate::quote::{self, Quote};
use crate::request::{Request, RequestStatus};
use crate::resolver::{Exclusion, Resolution, Resolver, RuleInput};
use crate::stage::StageRegistry;
use crate::store::Snapshot;

/// Knobs for one derivation pass.
#[derive(Debug, Clone, Copy)]
pub struct DeriveOptions<'a> {
    /// Also list won and lost deals, tagged with their outcome.
    pub include_closed: bool,
    pub orphan_policy: OrphanPolicy,
    pub distribution: &'a BTreeMap<String, String>,
}

impl<'a> DeriveOptions<'a> {
    /// Open deals only.
    pub fn open(config: &'a PipelineConfig) -> Self {
        Self {
            include_closed: false,
            orphan_policy: config.orphan_policy,
            distribution: &config.distribution,
        }
    }

    /// Open and closed deals, for reporting.
    pub fn all(config: &'a PipelineConfig) -> Self {
        Self {
            include_closed: true,
            ..Self::open(config)
        }
    }
}

/// Derive the pipeline's deals.
pub fn derive_deals(
    snapshot: Snapshot<'_>,
    registry: &StageRegistry,
    history: &TransitionLog,
    options: DeriveOptions<'_>,
) -> PipelineResult<Derivation> {
    let mut orphans = Vec::new();
    let known_clients: HashSet<&str> = snapshot.clients.iter().map(|c| c.id.as_str()).collect();

    let mut quotes = Vec::with_capacity(snapshot.quotes.len());
    for q in snapshot.quotes {
        if known_clients.contains(q.client_id.as_str()) {
            quotes.push(q);
        } else {
            orphan(&mut orphans, options.orphan_policy, "Quote", &q.id, &q.client_id)?;
        }
    }

    let resolver = Resolver::new(registry, options.distribution);
    let mut deals = Vec::new();

    for request in snapshot.requests {
        let Some(client) = client::find(snapshot.clients, &request.client_id) else {
            orphan(&mut orphans, options.orphan_policy, "Request", &request.id, &request.client_id)?;
            continue;
        };

        let closed_status = match request.status {
            status if status.is_open() => None,
            RequestStatus::ClosedWon | RequestStatus::Converted => Some(ClosedOutcome::Won),
            RequestStatus::ClosedLost => Some(ClosedOutcome::Lost),
            _ => continue,
        };

        let live = quote::live_quote(quotes.iter().copied(), &request.id);

        let placement = if let Some(outcome) = closed_status {
            if !options.include_closed {
                continue;
            }
            Placement::Closed(outcome)
        } else if let Some(outcome) = live.and_then(closing_outcome) {
            if !options.include_closed {
                debug!(request_id = %request.id, "Live quote closes request, leaving it off the board");
                continue;
            }
            Placement::Closed(outcome)
        } else {
            match resolver.resolve(&RuleInput {
                request,
                live_quote: live,
            }) {
                Resolution::Assigned { stage_id, .. } => Placement::Stage(stage_id),
                Resolution::Excluded { reason, .. } => {
                    if !options.include_closed {
                        continue;
                    }
                    Placement::Closed(match reason {
                        Exclusion::ClosedWon => ClosedOutcome::Won,
                        Exclusion::ClosedOut => ClosedOutcome::Lost,
                    })
                }
                Resolution::Unassigned => {
                    debug!(request_id = %request.id, "No stage for request");
                    continue;
                }
            }
        };

        deals.push(build_deal(client, request, live, placement, history));
    }

    Ok(Derivation { deals, orphans })
}

/// Outcome a live quote forces on its request, if it closes it.
fn closing_outcome(quote: &Quote) -> Option<ClosedOutcome> {
    if quote.status.is_won() {
        Some(ClosedOutcome::Won)
    } else if quote.status.closes_request() {
        Some(ClosedOutcome::Lost)
    } else {
        None
    }
}

fn orphan(
    orphans: &mut Vec<Orphan>,
    policy: OrphanPolicy,
    kind: &'static str,
    id: &str,
    client_id: &str,
) -> PipelineResult<()> {
    match policy {
        OrphanPolicy::Fail => Err(PipelineError::OrphanedRecord {
            kind,
            id: id.to_string(),
            client_id: client_id.to_string(),
        }),
        OrphanPolicy::Exclude => {
            warn!(kind, id = %id, client_id = %client_id, "Skipping record with missing client");
            orphans.push(Orphan {
                kind,
                id: id.to_string(),
                client_id: client_id.to_string(),
            });
            Ok(())
        }
    }
}

fn build_deal(
    client: &Client,
    request: &Request,
    live: Option<&Quote>,
    placement: Placement,
    history: &TransitionLog,
) -> Deal {
    let created_at = history
        .first_seen(&request.id)
        .map_or(request.requested_at, |seen| seen.min(request.requested_at));
    let stage_entered_at = stage_entered_at(request, live, &placement, history).unwrap_or(created_at);

    Deal {
        id: request.id.clone(),
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        title: request.title.clone(),
        property_address: client.address.to_string(),
        contact: client.contact_line(),
        requested_at: request.requested_at,
        amount: live.and_then(Quote::positive_amount),
        placement,
        kind: if live.is_some() {
            DealKind::Quote
        } else {
            DealKind::Request
        },
        quote_id: live.map(|q| q.id.clone()),
        created_at,
        stage_entered_at,
    }
}

/// When the deal entered its current placement: the recorded stage entry if
/// it matches, else the latest status change behind the placement.
fn stage_entered_at(
    request: &Request,
    live: Option<&Quote>,
    placement: &Placement,
    history: &TransitionLog,
) -> Option<DateTime<Utc>> {
    if let Placement::Stage(stage_id) = placement {
        if let Some(entry) = history.last_stage_entry(&request.id) {
            if &entry.to == stage_id {
                return Some(entry.at);
            }
        }
    }
    let request_change = history.last_status_change(&request.id);
    let quote_change = live.and_then(|q| history.last_status_change(&q.id));
    request_change.max(quote_change)
}
