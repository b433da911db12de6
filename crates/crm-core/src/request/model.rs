//! Service request domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A request for service raised by (or on behalf of) a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub service_details: String,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: RequestSource,
    /// Last user-managed stage this request was dragged into.
    #[serde(default)]
    pub manual_stage: Option<String>,
}

impl Request {
    /// Minimal request standing in for a quote that was created without one.
    pub fn backfill_for(quote: &crate::quote::Quote) -> Self {
        Self {
            id: backfill_request_id(&quote.id),
            client_id: quote.client_id.clone(),
            title: format!("Quote #{}", quote.quote_number),
            service_details: String::new(),
            requested_at: quote.created_at,
            status: RequestStatus::New,
            notes: None,
            source: RequestSource::QuoteBackfill {
                quote_id: quote.id.clone(),
            },
            manual_stage: None,
        }
    }
}

/// ID of the synthetic request created for a standalone quote.
pub fn backfill_request_id(quote_id: &str) -> String {
    format!("req-{}", quote_id)
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestSource {
    #[default]
    Intake,
    QuoteBackfill { quote_id: String },
}

/// Request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    AssessmentComplete,
    Overdue,
    Unscheduled,
    Converted,
    Archived,
    ClosedWon,
    ClosedLost,
}

impl RequestStatus {
    /// Parse from string. Accepts both the snake_case key and the label.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "new" => Some(Self::New),
            "assessment_complete" => Some(Self::AssessmentComplete),
            "overdue" => Some(Self::Overdue),
            "unscheduled" => Some(Self::Unscheduled),
            "converted" => Some(Self::Converted),
            "archived" => Some(Self::Archived),
            "closed_won" => Some(Self::ClosedWon),
            "closed_lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::AssessmentComplete => "assessment_complete",
            Self::Overdue => "overdue",
            Self::Unscheduled => "unscheduled",
            Self::Converted => "converted",
            Self::Archived => "archived",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::AssessmentComplete => "Assessment complete",
            Self::Overdue => "Overdue",
            Self::Unscheduled => "Unscheduled",
            Self::Converted => "Converted",
            Self::Archived => "Archived",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    /// Statuses that put a request on the board.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Self::New | Self::AssessmentComplete | Self::Overdue | Self::Unscheduled
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Archived | Self::ClosedWon | Self::ClosedLost)
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_str(s).ok_or_else(|| PipelineError::unknown_status("request", s))
    }
}
