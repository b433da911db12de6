//! Deal models.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One opportunity on the pipeline, derived from a request and its live
/// quote. Never stored; rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    /// Same as the request ID.
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub title: String,
    pub property_address: String,
    pub contact: String,
    pub requested_at: DateTime<Utc>,
    pub amount: Option<f64>,
    pub placement: Placement,
    pub kind: DealKind,
    pub quote_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub stage_entered_at: DateTime<Utc>,
}

impl Deal {
    pub fn stage_id(&self) -> Option<&str> {
        match &self.placement {
            Placement::Stage(id) => Some(id),
            Placement::Closed(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.placement, Placement::Stage(_))
    }

    pub fn is_won(&self) -> bool {
        self.placement == Placement::Closed(ClosedOutcome::Won)
    }

    pub fn time_in_stage(&self, now: DateTime<Utc>) -> Duration {
        now - self.stage_entered_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.requested_at
    }
}

/// Where a deal sits: a pipeline stage, or (in the all-deals view) a closed
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Placement {
    Stage(String),
    Closed(ClosedOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedOutcome {
    Won,
    Lost,
}

impl ClosedOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Won => "Closed Won",
            Self::Lost => "Closed Lost",
        }
    }
}

/// Whether the deal is backed by a quote or only by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DealKind {
    Request,
    Quote,
}

/// A record left out of derivation because its client does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub kind: &'static str,
    pub id: String,
    pub client_id: String,
}

/// Output of one derivation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Derivation {
    pub deals: Vec<Deal>,
    pub orphans: Vec<Orphan>,
}
