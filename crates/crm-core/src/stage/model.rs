//! Pipeline stage models.

use serde::{Deserialize, Serialize};

/// ID of the pinned first stage every pipeline starts with.
pub const NEW_DEALS: &str = "new-deals";

/// A column of the pipeline board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub title: String,
    pub order: u32,
    /// Days a deal may sit in this stage before it is flagged overdue.
    #[serde(default)]
    pub time_limit_days: Option<u32>,
    pub kind: StageKind,
}

impl Stage {
    pub fn is_system_managed(&self) -> bool {
        matches!(self.kind, StageKind::System(_))
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.kind, StageKind::Pinned)
    }
}

/// How a stage's membership and definition are controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// The initial stage: cannot be renamed, deleted or moved from first place.
    Pinned,
    /// Freely managed by the user; deals can be dragged in and out.
    User,
    /// Membership is computed from entity status; never draggable.
    System(SystemStage),
}

/// Catalog of system-managed stages, each tied to a request or quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStage {
    DraftQuote,
    QuoteAwaitingResponse,
    QuoteChangesRequested,
    AssessmentCompleted,
    OverdueAssessment,
    UnscheduledAssessment,
}

impl SystemStage {
    pub const ALL: [SystemStage; 6] = [
        Self::DraftQuote,
        Self::QuoteAwaitingResponse,
        Self::QuoteChangesRequested,
        Self::AssessmentCompleted,
        Self::OverdueAssessment,
        Self::UnscheduledAssessment,
    ];

    /// Stage ID used in the registry.
    pub fn id(&self) -> &'static str {
        match self {
            Self::DraftQuote => "draft-quote",
            Self::QuoteAwaitingResponse => "quote-awaiting-response",
            Self::QuoteChangesRequested => "quote-changes-requested",
            Self::AssessmentCompleted => "assessment-completed",
            Self::OverdueAssessment => "overdue-assessment",
            Self::UnscheduledAssessment => "unscheduled-assessment",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::DraftQuote => "Draft Quote",
            Self::QuoteAwaitingResponse => "Quote Awaiting Response",
            Self::QuoteChangesRequested => "Quote Changes Requested",
            Self::AssessmentCompleted => "Assessment Completed",
            Self::OverdueAssessment => "Overdue Assessment",
            Self::UnscheduledAssessment => "Unscheduled Assessment",
        }
    }

    /// Parse from a stage ID or title.
    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '_'], "-");
        Self::ALL.into_iter().find(|stage| stage.id() == key)
    }
}

/// Default stage definitions for a new pipeline: (id, title, kind, time limit).
pub const DEFAULT_STAGES: &[(&str, &str, StageKind, Option<u32>)] = &[
    (NEW_DEALS, "New Lead", StageKind::Pinned, Some(2)),
    ("contacted", "Contacted", StageKind::User, Some(5)),
    (
        "unscheduled-assessment",
        "Unscheduled Assessment",
        StageKind::System(SystemStage::UnscheduledAssessment),
        Some(3),
    ),
    (
        "overdue-assessment",
        "Overdue Assessment",
        StageKind::System(SystemStage::OverdueAssessment),
        Some(1),
    ),
    (
        "assessment-completed",
        "Assessment Completed",
        StageKind::System(SystemStage::AssessmentCompleted),
        Some(3),
    ),
    (
        "draft-quote",
        "Draft Quote",
        StageKind::System(SystemStage::DraftQuote),
        Some(2),
    ),
    (
        "quote-awaiting-response",
        "Quote Awaiting Response",
        StageKind::System(SystemStage::QuoteAwaitingResponse),
        Some(7),
    ),
    (
        "quote-changes-requested",
        "Quote Changes Requested",
        StageKind::System(SystemStage::QuoteChangesRequested),
        Some(3),
    ),
    ("followup", "Follow-up", StageKind::User, Some(14)),
];
