//! Allow/deny outcomes for guarded business rules.

use serde::{Deserialize, Serialize};

/// Outcome of a guarded operation. A denial is not an error: nothing changed
/// and the message is meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "message", rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    pub fn deny(msg: impl Into<String>) -> Self {
        Self::Deny(msg.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The user-facing notice, if the operation was denied.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Deny(msg) => Some(msg),
        }
    }
}
