//! Stage registry: the ordered, user-configurable list of pipeline stages.

pub mod model;

pub use model::{Stage, StageKind, SystemStage, DEFAULT_STAGES, NEW_DEALS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::verdict::Verdict;

/// Ordered set of stages. The pinned stage, when present, is always first
/// and orders are kept contiguous from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl StageRegistry {
    /// Build a registry from arbitrary stage records, normalizing the order.
    pub fn new(mut stages: Vec<Stage>) -> Self {
        stages.sort_by_key(|s| (!s.is_pinned(), s.order));
        let mut registry = Self { stages };
        registry.renumber();
        registry
    }

    /// The hard-coded default pipeline.
    pub fn with_defaults() -> Self {
        let stages = DEFAULT_STAGES
            .iter()
            .enumerate()
            .map(|(i, (id, title, kind, limit))| Stage {
                id: id.to_string(),
                title: title.to_string(),
                order: i as u32 + 1,
                time_limit_days: *limit,
                kind: *kind,
            })
            .collect();
        Self::new(stages)
    }

    /// Stages in display order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The registered stage for a system status, if the user kept it.
    pub fn system_stage(&self, system: SystemStage) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.kind == StageKind::System(system))
    }

    fn get_mut(&mut self, id: &str) -> PipelineResult<&mut Stage> {
        self.stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PipelineError::StageNotFound(id.to_string()))
    }

    fn next_order(&self) -> u32 {
        self.stages.len() as u32 + 1
    }

    fn renumber(&mut self) {
        for (i, stage) in self.stages.iter_mut().enumerate() {
            stage.order = i as u32 + 1;
        }
    }

    /// Derive a unique stage ID from a title. Catalog IDs stay reserved for
    /// system stages.
    fn unique_id(&self, title: &str) -> String {
        let slug: String = title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let base = if slug.is_empty() { "stage".to_string() } else { slug };

        let taken = |id: &str| {
            self.contains(id) || id == NEW_DEALS || SystemStage::from_str(id).is_some()
        };
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or(base)
    }

    /// Append a user-managed stage at the end of the pipeline.
    pub fn add_stage(&mut self, title: &str) -> &Stage {
        let stage = Stage {
            id: self.unique_id(title),
            title: title.trim().to_string(),
            order: self.next_order(),
            time_limit_days: None,
            kind: StageKind::User,
        };
        debug!(stage_id = %stage.id, "Adding user stage");
        self.stages.push(stage);
        &self.stages[self.stages.len() - 1]
    }

    /// Append a system-managed stage from the catalog.
    pub fn add_system_stage(&mut self, system: SystemStage) -> PipelineResult<&Stage> {
        if self.contains(system.id()) {
            return Err(PipelineError::DuplicateStage(system.id().to_string()));
        }
        let stage = Stage {
            id: system.id().to_string(),
            title: system.title().to_string(),
            order: self.next_order(),
            time_limit_days: None,
            kind: StageKind::System(system),
        };
        debug!(stage_id = %stage.id, "Adding system stage");
        self.stages.push(stage);
        Ok(&self.stages[self.stages.len() - 1])
    }

    /// Rename a stage. The pinned stage is left untouched.
    pub fn rename(&mut self, id: &str, title: &str) -> PipelineResult<Verdict> {
        let stage = self.get_mut(id)?;
        match stage.kind {
            StageKind::Pinned => {
                warn!(stage_id = %id, "Refusing to rename pinned stage");
                Ok(Verdict::deny(format!(
                    "'{}' is a fixed stage and cannot be renamed",
                    stage.title
                )))
            }
            StageKind::User | StageKind::System(_) => {
                stage.title = title.trim().to_string();
                Ok(Verdict::Allow)
            }
        }
    }

    /// Delete a stage. The pinned stage is left untouched.
    pub fn delete(&mut self, id: &str) -> PipelineResult<Verdict> {
        let stage = self
            .get(id)
            .ok_or_else(|| PipelineError::StageNotFound(id.to_string()))?;
        match stage.kind {
            StageKind::Pinned => {
                warn!(stage_id = %id, "Refusing to delete pinned stage");
                Ok(Verdict::deny(format!(
                    "'{}' is a fixed stage and cannot be deleted",
                    stage.title
                )))
            }
            StageKind::User | StageKind::System(_) => {
                self.stages.retain(|s| s.id != id);
                self.renumber();
                debug!(stage_id = %id, "Deleted stage");
                Ok(Verdict::Allow)
            }
        }
    }

    /// Apply a user-submitted order. Listed stages come first in the given
    /// order, unlisted ones keep their relative order after them, and the
    /// pinned stage is put back in first place wherever it was dropped.
    pub fn reorder(&mut self, ids: &[String]) -> PipelineResult<()> {
        let mut reordered = Vec::with_capacity(self.stages.len());
        for id in ids {
            if reordered.iter().any(|s: &Stage| &s.id == id) {
                continue;
            }
            let stage = self
                .get(id)
                .cloned()
                .ok_or_else(|| PipelineError::StageNotFound(id.clone()))?;
            reordered.push(stage);
        }
        for stage in &self.stages {
            if !reordered.iter().any(|s| s.id == stage.id) {
                reordered.push(stage.clone());
            }
        }

        if let Some(pos) = reordered.iter().position(Stage::is_pinned) {
            if pos != 0 {
                debug!(from = pos + 1, "Pinned stage moved back to first place");
                let pinned = reordered.remove(pos);
                reordered.insert(0, pinned);
            }
        }

        self.stages = reordered;
        self.renumber();
        Ok(())
    }

    /// Set or clear a stage's time limit.
    pub fn set_time_limit(&mut self, id: &str, days: Option<u32>) -> PipelineResult<()> {
        self.get_mut(id)?.time_limit_days = days;
        Ok(())
    }

    /// Apply configured time-limit overrides; unknown stage IDs are ignored.
    pub fn apply_time_limits(&mut self, limits: &BTreeMap<String, u32>) {
        for stage in &mut self.stages {
            if let Some(days) = limits.get(&stage.id) {
                stage.time_limit_days = Some(*days);
            }
        }
    }
}
