//! Quote domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// A priced offer sent to a client, usually for a specific request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub client_id: String,
    #[serde(default)]
    pub request_id: Option<String>,
    pub quote_number: String,
    pub amount: f64,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub converted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub salesperson: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Quote {
    /// The amount, if it is a usable positive number.
    pub fn positive_amount(&self) -> Option<f64> {
        (self.amount.is_finite() && self.amount > 0.0).then_some(self.amount)
    }

    pub fn is_standalone(&self) -> bool {
        self.request_id.is_none()
    }

    /// Set the status, stamping the matching milestone the first time it is
    /// reached. Returns the previous status.
    pub fn transition(&mut self, status: QuoteStatus, now: DateTime<Utc>) -> QuoteStatus {
        let previous = self.status;
        self.status = status;
        let stamp = match status {
            QuoteStatus::AwaitingResponse => Some(&mut self.sent_at),
            QuoteStatus::Approved => Some(&mut self.approved_at),
            QuoteStatus::Converted => Some(&mut self.converted_at),
            _ => None,
        };
        if let Some(slot) = stamp {
            slot.get_or_insert(now);
        }
        previous
    }
}

/// A validated quote amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> PipelineResult<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(PipelineError::InvalidAmount(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    AwaitingResponse,
    ChangesRequested,
    Approved,
    Converted,
    Archived,
}

impl QuoteStatus {
    /// Parse from string. Accepts both the snake_case key and the label.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "draft" => Some(Self::Draft),
            "awaiting_response" => Some(Self::AwaitingResponse),
            "changes_requested" => Some(Self::ChangesRequested),
            "approved" => Some(Self::Approved),
            "converted" => Some(Self::Converted),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AwaitingResponse => "awaiting_response",
            Self::ChangesRequested => "changes_requested",
            Self::Approved => "approved",
            Self::Converted => "converted",
            Self::Archived => "archived",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::AwaitingResponse => "Awaiting Response",
            Self::ChangesRequested => "Changes Requested",
            Self::Approved => "Approved",
            Self::Converted => "Converted",
            Self::Archived => "Archived",
        }
    }

    /// The deal was won through this quote.
    pub fn is_won(&self) -> bool {
        matches!(self, Self::Approved | Self::Converted)
    }

    /// The quote closes its request, won or not.
    pub fn closes_request(&self) -> bool {
        matches!(self, Self::Approved | Self::Converted | Self::Archived)
    }
}

impl TryFrom<&str> for QuoteStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_str(s).ok_or_else(|| PipelineError::unknown_status("quote", s))
    }
}
