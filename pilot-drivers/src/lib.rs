//! Driver layer for verified form-filling against a remote page.
//!
//! The page renders asynchronously, so nothing a command channel reports
//! says the DOM has caught up. The driver closes that gap by polling and by
//! fixed settle delays between steps.
//!
//! - [`automation::AutomationDriver`]: click-until-focused and fill-or-replace
//! - [`automation::RemotePage`] / [`automation::FocusedInput`]: page queries
//!   and focus-relative edits
//! - [`automation::ActionChannel`]: command sink for click/type intents
//! - [`automation::DispatchChannel`]: queue that serializes intents into one executor
//! - [`browser::WebDriverSession`]: `fantoccini` client implementing both collaborators
pub mod automation;
pub mod browser;
