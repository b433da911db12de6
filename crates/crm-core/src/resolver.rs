//! Stage assignment.
//!
//! An ordered rule table maps a request and its live quote to a pipeline
//! stage. The first rule whose predicate matches and whose target stage is
//! still registered wins; a rule whose stage was deleted is skipped.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::quote::{Quote, QuoteStatus};
use crate::request::{Request, RequestStatus};
use crate::stage::{StageKind, StageRegistry, SystemStage, NEW_DEALS};

/// What a rule looks at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub request: &'a Request,
    pub live_quote: Option<&'a Quote>,
}

impl RuleInput<'_> {
    fn quote_status(&self) -> Option<QuoteStatus> {
        self.live_quote.map(|q| q.status)
    }
}

/// Where a matching rule sends the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A system-managed stage from the catalog.
    System(SystemStage),
    /// A user-managed stage by ID.
    Stage(&'static str),
    /// The request's last drag target, else the given user-managed stage.
    DraggedOr(&'static str),
    /// The request's own placement: its last drag target, else the
    /// distribution map, else the first stage.
    Placement,
    /// Drop the deal from the open pipeline.
    Exclude(Exclusion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// The live quote was approved or converted.
    ClosedWon,
    /// The live quote was archived.
    ClosedOut,
}

pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&RuleInput<'_>) -> bool,
    pub target: Target,
}

fn quote_changes_requested(input: &RuleInput<'_>) -> bool {
    input.quote_status() == Some(QuoteStatus::ChangesRequested)
}

fn quote_awaiting_response(input: &RuleInput<'_>) -> bool {
    input.quote_status() == Some(QuoteStatus::AwaitingResponse)
}

fn quote_draft(input: &RuleInput<'_>) -> bool {
    input.quote_status() == Some(QuoteStatus::Draft)
}

fn quote_won(input: &RuleInput<'_>) -> bool {
    input.quote_status().is_some_and(|s| s.is_won())
}

fn quote_archived(input: &RuleInput<'_>) -> bool {
    input.quote_status() == Some(QuoteStatus::Archived)
}

fn assessment_complete(input: &RuleInput<'_>) -> bool {
    input.request.status == RequestStatus::AssessmentComplete
}

fn assessment_overdue(input: &RuleInput<'_>) -> bool {
    input.request.status == RequestStatus::Overdue
}

fn assessment_unscheduled(input: &RuleInput<'_>) -> bool {
    input.request.status == RequestStatus::Unscheduled
}

fn assessment_pending(input: &RuleInput<'_>) -> bool {
    assessment_overdue(input) || assessment_unscheduled(input)
}

fn request_new(input: &RuleInput<'_>) -> bool {
    input.request.status == RequestStatus::New
}

fn always(_: &RuleInput<'_>) -> bool {
    true
}

/// The rule table, highest priority first.
pub const RULES: &[Rule] = &[
    Rule {
        name: "quote-changes-requested",
        matches: quote_changes_requested,
        target: Target::System(SystemStage::QuoteChangesRequested),
    },
    Rule {
        name: "quote-awaiting-response",
        matches: quote_awaiting_response,
        target: Target::System(SystemStage::QuoteAwaitingResponse),
    },
    Rule {
        name: "quote-draft",
        matches: quote_draft,
        target: Target::System(SystemStage::DraftQuote),
    },
    Rule {
        name: "assessment-complete",
        matches: assessment_complete,
        target: Target::System(SystemStage::AssessmentCompleted),
    },
    Rule {
        name: "assessment-overdue",
        matches: assessment_overdue,
        target: Target::System(SystemStage::OverdueAssessment),
    },
    Rule {
        name: "assessment-unscheduled",
        matches: assessment_unscheduled,
        target: Target::System(SystemStage::UnscheduledAssessment),
    },
    Rule {
        name: "quote-won",
        matches: quote_won,
        target: Target::Exclude(Exclusion::ClosedWon),
    },
    Rule {
        name: "quote-archived",
        matches: quote_archived,
        target: Target::Exclude(Exclusion::ClosedOut),
    },
    Rule {
        name: "assessment-complete-manual",
        matches: assessment_complete,
        target: Target::DraggedOr("followup"),
    },
    Rule {
        name: "assessment-pending-manual",
        matches: assessment_pending,
        target: Target::DraggedOr("contacted"),
    },
    Rule {
        name: "new-request",
        matches: request_new,
        target: Target::Placement,
    },
    Rule {
        name: "default",
        matches: always,
        target: Target::Stage(NEW_DEALS),
    },
];

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Assigned {
        stage_id: String,
        rule: &'static str,
    },
    Excluded {
        reason: Exclusion,
        rule: &'static str,
    },
    /// No rule produced a registered stage.
    Unassigned,
}

impl Resolution {
    pub fn stage_id(&self) -> Option<&str> {
        match self {
            Self::Assigned { stage_id, .. } => Some(stage_id),
            _ => None,
        }
    }
}

pub struct Resolver<'a> {
    registry: &'a StageRegistry,
    distribution: &'a BTreeMap<String, String>,
    rules: &'a [Rule],
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a StageRegistry, distribution: &'a BTreeMap<String, String>) -> Self {
        Self {
            registry,
            distribution,
            rules: RULES,
        }
    }

    /// Use a custom rule table.
    pub fn with_rules(mut self, rules: &'a [Rule]) -> Self {
        self.rules = rules;
        self
    }

    pub fn resolve(&self, input: &RuleInput<'_>) -> Resolution {
        for rule in self.rules {
            if !(rule.matches)(input) {
                continue;
            }
            match self.target_stage(rule.target, input) {
                Ok(Some(stage_id)) => {
                    trace!(request_id = %input.request.id, rule = rule.name, stage_id = %stage_id, "Rule matched");
                    return Resolution::Assigned {
                        stage_id,
                        rule: rule.name,
                    };
                }
                Ok(None) => {
                    trace!(request_id = %input.request.id, rule = rule.name, "Rule target not registered, skipping");
                }
                Err(reason) => {
                    trace!(request_id = %input.request.id, rule = rule.name, "Rule excludes request");
                    return Resolution::Excluded {
                        reason,
                        rule: rule.name,
                    };
                }
            }
        }
        Resolution::Unassigned
    }

    /// The registered stage a target points at, `None` if it is gone, or
    /// the exclusion it stands for.
    fn target_stage(&self, target: Target, input: &RuleInput<'_>) -> Result<Option<String>, Exclusion> {
        let stage = match target {
            Target::Exclude(reason) => return Err(reason),
            Target::System(system) => self.registry.system_stage(system),
            Target::Stage(id) => self.manual_stage(id),
            Target::DraggedOr(id) => self.dragged_stage(input).or_else(|| self.manual_stage(id)),
            Target::Placement => self
                .dragged_stage(input)
                .or_else(|| {
                    self.distribution
                        .get(&input.request.id)
                        .and_then(|id| self.manual_stage(id))
                })
                .or_else(|| self.manual_stage(NEW_DEALS)),
        };
        Ok(stage.map(|s| s.id.clone()))
    }

    fn dragged_stage(&self, input: &RuleInput<'_>) -> Option<&'a crate::stage::Stage> {
        input
            .request
            .manual_stage
            .as_deref()
            .and_then(|id| self.manual_stage(id))
    }

    /// A registered stage users may place deals in.
    fn manual_stage(&self, id: &str) -> Option<&'a crate::stage::Stage> {
        self.registry
            .get(id)
            .filter(|s| matches!(s.kind, StageKind::User | StageKind::Pinned))
    }
}
