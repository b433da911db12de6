//! Drag-and-drop guards.
//!
//! Consulted before a user moves a deal between stages. System-managed stages
//! follow entity status, so deals can be neither dropped into nor dragged out
//! of them by hand.

use crate::stage::{StageKind, StageRegistry};
use crate::verdict::Verdict;

/// May a deal be dropped into this stage?
pub fn can_drop_into(registry: &StageRegistry, stage_id: &str) -> Verdict {
    match registry.get(stage_id).map(|s| (s.kind, &s.title)) {
        None => Verdict::deny(format!("Stage '{}' does not exist", stage_id)),
        Some((StageKind::System(_), title)) => Verdict::deny(format!(
            "'{}' is automatically managed; deals cannot be dropped here manually",
            title
        )),
        Some((StageKind::User | StageKind::Pinned, _)) => Verdict::Allow,
    }
}

/// May a deal be dragged out of this stage?
pub fn can_drag_from(registry: &StageRegistry, stage_id: &str) -> Verdict {
    match registry.get(stage_id).map(|s| (s.kind, &s.title)) {
        None => Verdict::deny(format!("Stage '{}' does not exist", stage_id)),
        Some((StageKind::System(_), title)) => Verdict::deny(format!(
            "'{}' is automatically managed; deals cannot be moved from here manually",
            title
        )),
        Some((StageKind::User | StageKind::Pinned, _)) => Verdict::Allow,
    }
}

/// Both guards for a move from one stage to another.
pub fn can_move(registry: &StageRegistry, from: &str, to: &str) -> Verdict {
    match can_drag_from(registry, from) {
        Verdict::Allow => can_drop_into(registry, to),
        denied => denied,
    }
}
