use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::automation::{
    error::DriverError,
    remote::{ActionChannel, Focused, Intent, RemotePage},
    timing::{Delay, DriverTimings, FocusPolicy, PostTypeCheck, TokioDelay},
};

/// Which path [`AutomationDriver::fill_text`] takes for a given field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPlan {
    /// The field already holds the intended text.
    AlreadySet,
    /// Focus, select all, delete, then type.
    Replace,
    /// Focus, then type.
    Empty,
}

impl FillPlan {
    pub fn decide(current: &str, intended: &str) -> Self {
        if current == intended {
            FillPlan::AlreadySet
        } else if current.is_empty() {
            FillPlan::Empty
        } else {
            FillPlan::Replace
        }
    }
}

/// Sequences verified interactions against one page through one channel.
///
/// The driver keeps no per-call state. Concurrent calls against the same
/// selector race each other; serialize them in the caller if that matters.
pub struct AutomationDriver {
    channel: Arc<dyn ActionChannel>,
    page: Arc<dyn RemotePage>,
    delay: Arc<dyn Delay>,
    timings: DriverTimings,
    focus_policy: FocusPolicy,
    post_type: PostTypeCheck,
}

impl AutomationDriver {
    /// Bind a driver to a channel and a page, with default timings and policy.
    pub fn new(channel: Arc<dyn ActionChannel>, page: Arc<dyn RemotePage>) -> Self {
        Self {
            channel,
            page,
            delay: Arc::new(TokioDelay),
            timings: DriverTimings::default(),
            focus_policy: FocusPolicy::default(),
            post_type: PostTypeCheck::default(),
        }
    }

    /// Bind a driver to a single handle that is both the channel and the page.
    pub fn from_target<T>(target: Arc<T>) -> Self
    where
        T: ActionChannel + RemotePage + 'static,
    {
        Self::new(target.clone(), target)
    }

    pub fn with_timings(mut self, timings: DriverTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_focus_policy(mut self, policy: FocusPolicy) -> Self {
        self.focus_policy = policy;
        self
    }

    pub fn with_post_type_check(mut self, check: PostTypeCheck) -> Self {
        self.post_type = check;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn timings(&self) -> &DriverTimings {
        &self.timings
    }

    pub fn focus_policy(&self) -> &FocusPolicy {
        &self.focus_policy
    }

    /// Click `selector` until the page reports it focused.
    ///
    /// Each unsuccessful poll submits a click and waits `focus_retry` before
    /// polling again. Fails with [`DriverError::FocusTimeout`] once the
    /// [`FocusPolicy`] is exhausted; with [`FocusPolicy::unbounded`] it only
    /// returns once focus is observed.
    #[instrument(target = "pilot.driver", skip(self))]
    pub async fn ensure_focused(&self, selector: &str) -> Result<(), DriverError> {
        self.acquire_focus(selector).await.map(|_| ())
    }

    /// Make the field at `selector` hold `text`.
    ///
    /// A field that already holds `text` is left alone. A non-empty field is
    /// cleared with select-all + delete before typing; an empty one is typed
    /// into directly.
    #[instrument(target = "pilot.driver", skip(self, text), fields(chars = text.chars().count()))]
    pub async fn fill_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let current = self.page.current_value(selector).await?.unwrap_or_default();
        let plan = FillPlan::decide(&current, text);
        debug!(target: "pilot.driver", ?plan, "read current value");

        match plan {
            FillPlan::AlreadySet => return Ok(()),
            FillPlan::Replace => {
                let focused = self.acquire_focus(selector).await?;
                focused.select_all().await?;
                self.delay.wait(self.timings.post_select).await;
                focused.delete_selection().await?;
            }
            FillPlan::Empty => {
                self.acquire_focus(selector).await?;
            }
        }

        self.delay.wait(self.timings.post_delete).await;
        self.channel.submit(Intent::Type(text.to_string())).await?;

        if let PostTypeCheck::Verify { settle } = self.post_type {
            self.delay.wait(settle).await;
            let actual = self.page.current_value(selector).await?.unwrap_or_default();
            if actual != text {
                warn!(target: "pilot.driver", "field does not hold typed text");
                return Err(DriverError::Unverified {
                    selector: selector.to_string(),
                    expected: text.to_string(),
                    actual,
                });
            }
        }

        info!(target: "pilot.driver", ?plan, "field filled");
        Ok(())
    }

    async fn acquire_focus<'a>(&'a self, selector: &'a str) -> Result<Focused<'a>, DriverError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        while !self.page.is_selected(selector).await? {
            let elapsed = started.elapsed();
            if !self.focus_policy.allows(attempts, elapsed) {
                warn!(target: "pilot.driver", attempts, ?elapsed, "giving up on focus");
                return Err(DriverError::FocusTimeout {
                    selector: selector.to_string(),
                    attempts,
                    elapsed,
                });
            }

            debug!(target: "pilot.driver", attempt = attempts + 1, "not focused; clicking");
            self.channel
                .submit(Intent::Click(selector.to_string()))
                .await?;
            attempts += 1;
            self.delay.wait(self.timings.focus_retry).await;
        }

        if attempts > 0 {
            debug!(target: "pilot.driver", attempts, "focus acquired");
        }
        Ok(Focused::new(selector, self.page.focused()))
    }
}
