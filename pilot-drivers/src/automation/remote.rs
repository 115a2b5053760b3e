use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::automation::error::DriverError;

/// A discrete command submitted through an [`ActionChannel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Click the element matching the selector.
    Click(String),
    /// Type text into whatever element currently holds focus.
    Type(String),
}

impl fmt::Display for Intent {
    // Typed text can be a credential, so only its length is rendered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Click(selector) => write!(f, "click({selector})"),
            Intent::Type(text) => write!(f, "type({} chars)", text.chars().count()),
        }
    }
}

/// Acknowledgement that an intent was accepted and forwarded.
///
/// It does not mean the page has finished reacting to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack;

/// Asynchronous sink for click/type intents.
#[async_trait]
pub trait ActionChannel: Send + Sync {
    /// Forward `intent`. Resolves once it is accepted, not once it has rendered.
    async fn submit(&self, intent: Intent) -> Result<Ack, DriverError>;
}

/// Read access to the hosted page plus its focus-relative editing commands.
#[async_trait]
pub trait RemotePage: Send + Sync {
    /// Present text content of the field. `None` and `Some("")` both mean empty.
    ///
    /// Fails with [`DriverError::Lookup`] when nothing matches `selector`.
    async fn current_value(&self, selector: &str) -> Result<Option<String>, DriverError>;

    /// Whether the element matching `selector` currently holds input focus.
    async fn is_selected(&self, selector: &str) -> Result<bool, DriverError>;

    /// Editing commands that act on the currently focused element.
    fn focused(&self) -> &dyn FocusedInput;
}

/// Commands scoped to whatever element holds focus on the page.
///
/// Focus must already be established. The driver only reaches these through
/// a [`Focused`] token.
#[async_trait]
pub trait FocusedInput: Send + Sync {
    async fn select_all(&self) -> Result<(), DriverError>;
    async fn delete_selection(&self) -> Result<(), DriverError>;
}

/// Proof that focus on `selector` was observed; unlocks [`FocusedInput`].
pub struct Focused<'a> {
    selector: &'a str,
    input: &'a dyn FocusedInput,
}

impl<'a> Focused<'a> {
    pub(crate) fn new(selector: &'a str, input: &'a dyn FocusedInput) -> Self {
        Self { selector, input }
    }

    pub fn selector(&self) -> &str {
        self.selector
    }

    pub async fn select_all(&self) -> Result<(), DriverError> {
        self.input.select_all().await
    }

    pub async fn delete_selection(&self) -> Result<(), DriverError> {
        self.input.delete_selection().await
    }
}
