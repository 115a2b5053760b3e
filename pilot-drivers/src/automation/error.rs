use std::time::Duration;

use crate::automation::remote::Intent;

/// Failures surfaced by the driver and its collaborators.
///
/// Nothing here is retried by the driver. The focus loop only retries the
/// click itself, never a collaborator error.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// The selector did not resolve to any element on a page read.
    #[error("no element matches selector `{selector}`")]
    Lookup { selector: String },

    /// The action channel rejected or failed to forward an intent.
    #[error("channel failed to forward {intent}: {reason}")]
    Channel { intent: Intent, reason: String },

    /// The focus poll loop exhausted its [`FocusPolicy`](crate::automation::FocusPolicy).
    #[error("`{selector}` not focused after {attempts} clicks ({elapsed:?})")]
    FocusTimeout {
        selector: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// Post-type verification read back something other than the typed text.
    #[error("`{selector}` holds {actual:?} after typing, expected {expected:?}")]
    Unverified {
        selector: String,
        expected: String,
        actual: String,
    },

    /// Any other failure reported by the remote page.
    #[error("remote page error: {0}")]
    Remote(String),
}

impl DriverError {
    pub fn lookup(selector: &str) -> Self {
        Self::Lookup {
            selector: selector.to_string(),
        }
    }

    pub fn channel(intent: Intent, reason: impl Into<String>) -> Self {
        Self::Channel {
            intent,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "lookup",
            Self::Channel { .. } => "channel",
            Self::FocusTimeout { .. } => "focus_timeout",
            Self::Unverified { .. } => "unverified",
            Self::Remote(_) => "remote",
        }
    }
}
