//! Transition history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    RequestStatus,
    QuoteStatus,
    /// A deal entered a pipeline stage.
    Stage,
}

/// One recorded change: `entity_id` went from `from` to `to` at `at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub entity_id: String,
    pub kind: TransitionKind,
    pub from: Option<String>,
    pub to: String,
    pub at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn new(
        entity_id: &str,
        kind: TransitionKind,
        from: Option<&str>,
        to: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            kind,
            from: from.map(str::to_string),
            to: to.to_string(),
            at,
        }
    }
}
