//! Append-only log of status changes and stage entries.
//!
//! Deal timestamps ("created", "entered current stage") are answered from
//! this log instead of being stored on the deal.

pub mod model;

pub use model::{TransitionEvent, TransitionKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionLog {
    events: Vec<TransitionEvent>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        entity_id: &str,
        kind: TransitionKind,
        from: Option<&str>,
        to: &str,
        at: DateTime<Utc>,
    ) {
        self.push(TransitionEvent::new(entity_id, kind, from, to, at));
    }

    pub fn push(&mut self, event: TransitionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TransitionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events for one entity, oldest first.
    pub fn events_for<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a TransitionEvent> {
        self.events.iter().filter(move |e| e.entity_id == entity_id)
    }

    /// Time of the first event recorded for an entity.
    pub fn first_seen(&self, entity_id: &str) -> Option<DateTime<Utc>> {
        self.events_for(entity_id).map(|e| e.at).min()
    }

    /// Most recent stage entry recorded for a deal.
    pub fn last_stage_entry(&self, deal_id: &str) -> Option<&TransitionEvent> {
        self.events
            .iter()
            .filter(|e| e.entity_id == deal_id && e.kind == TransitionKind::Stage)
            .last()
    }

    /// Time of the most recent status change of an entity.
    pub fn last_status_change(&self, entity_id: &str) -> Option<DateTime<Utc>> {
        self.events_for(entity_id)
            .filter(|e| e.kind != TransitionKind::Stage)
            .map(|e| e.at)
            .max()
    }
}
