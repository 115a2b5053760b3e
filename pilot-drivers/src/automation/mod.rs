//! Verified click/type sequencing over asynchronous collaborators.
//!
//! The driver talks to the page through two traits: [`RemotePage`] for reads
//! and focus-relative edits, [`ActionChannel`] for click/type intents. Waits
//! go through [`Delay`] so the settle timings stay outside the fill logic.
mod dispatch;
mod driver;
mod error;
mod remote;
mod timing;

pub use dispatch::{DispatchChannel, Dispatched, IntentReceiver};
pub use driver::{AutomationDriver, FillPlan};
pub use error::DriverError;
pub use remote::{Ack, ActionChannel, Focused, FocusedInput, Intent, RemotePage};
pub use timing::{
    Delay, DriverTimings, FocusPolicy, PostTypeCheck, TokioDelay, FOCUS_RETRY, POST_DELETE,
    POST_SELECT,
};
