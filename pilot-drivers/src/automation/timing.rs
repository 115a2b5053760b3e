use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

/// Click-to-focus render budget between focus polls.
pub const FOCUS_RETRY: Duration = Duration::from_millis(800);
/// Time for a select-all to register before the selection is deleted.
pub const POST_SELECT: Duration = Duration::from_millis(300);
/// Time for a cleared or newly focused field to settle before typing.
pub const POST_DELETE: Duration = Duration::from_millis(500);

/// Settle delays used between driver steps.
///
/// These are empirically tuned, not derived from any signal on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimings {
    pub focus_retry: Duration,
    pub post_select: Duration,
    pub post_delete: Duration,
}

impl Default for DriverTimings {
    fn default() -> Self {
        Self {
            focus_retry: FOCUS_RETRY,
            post_select: POST_SELECT,
            post_delete: POST_DELETE,
        }
    }
}

impl DriverTimings {
    pub fn from_millis(focus_retry: u64, post_select: u64, post_delete: u64) -> Self {
        Self {
            focus_retry: Duration::from_millis(focus_retry),
            post_select: Duration::from_millis(post_select),
            post_delete: Duration::from_millis(post_delete),
        }
    }
}

/// Bound on the click-until-focused loop.
///
/// With both limits `None` the loop only ends once focus is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPolicy {
    /// Maximum number of clicks before giving up.
    pub max_attempts: Option<u32>,
    /// Maximum time since the first poll before giving up.
    pub max_elapsed: Option<Duration>,
}

impl Default for FocusPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(60)),
        }
    }
}

impl FocusPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            max_elapsed: None,
        }
    }

    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            max_elapsed: None,
        }
    }

    /// Whether another click is still allowed after `attempts` clicks and `elapsed` time.
    pub fn allows(&self, attempts: u32, elapsed: Duration) -> bool {
        let under_attempts = self.max_attempts.map_or(true, |max| attempts < max);
        let under_elapsed = self.max_elapsed.map_or(true, |max| elapsed < max);
        under_attempts && under_elapsed
    }
}

/// What to do after the final `Type` intent has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostTypeCheck {
    /// Trust the channel; do not read the field back.
    #[default]
    Skip,
    /// Wait `settle`, then read the field back and require it to match.
    Verify { settle: Duration },
}

/// Suspends the calling task. Swappable so tests can record waits.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// [`Delay`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration).await;
        }
    }
}
