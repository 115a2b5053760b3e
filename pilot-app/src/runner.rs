use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pilot_common::observability::LogConfig;
use pilot_config::{LoggingConfig, PilotConfig, StepDetails, StepSpec, WebDriverConfig};
use pilot_drivers::automation::{
    ActionChannel, AutomationDriver, DispatchChannel, DriverTimings, FocusPolicy, PostTypeCheck,
    RemotePage,
};
use pilot_drivers::browser::{WebDriverSession, WebDriverSettings};
use tracing::{error, info, warn};

const DEFAULT_QUEUE: usize = 64;

/// What a run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub executed: usize,
    pub skipped: usize,
}

pub fn log_config(cfg: &LoggingConfig) -> LogConfig {
    LogConfig {
        log_dir: cfg.dir.clone(),
        emit_stderr: cfg.emit_stderr,
        format: cfg.format,
        default_filter: cfg.filter.clone(),
        ..LogConfig::default()
    }
}

pub fn webdriver_settings(cfg: &WebDriverConfig) -> WebDriverSettings {
    WebDriverSettings {
        url: cfg.url.clone(),
        headless: cfg.headless,
        window: cfg.window,
    }
}

/// Driver with the timings, focus bound and verification from `cfg`.
pub fn build_driver(
    cfg: &PilotConfig,
    channel: Arc<dyn ActionChannel>,
    page: Arc<dyn RemotePage>,
) -> AutomationDriver {
    let timings = DriverTimings::from_millis(
        cfg.timings.focus_retry_ms,
        cfg.timings.post_select_ms,
        cfg.timings.post_delete_ms,
    );
    let focus = FocusPolicy {
        max_attempts: cfg.focus.max_attempts,
        max_elapsed: cfg.focus.max_elapsed_ms.map(Duration::from_millis),
    };
    let check = if cfg.verify.enabled {
        PostTypeCheck::Verify {
            settle: Duration::from_millis(cfg.verify.settle_ms),
        }
    } else {
        PostTypeCheck::Skip
    };

    AutomationDriver::new(channel, page)
        .with_timings(timings)
        .with_focus_policy(focus)
        .with_post_type_check(check)
}

/// Execute enabled steps in order, stopping at the first failure.
pub async fn run_steps(driver: &AutomationDriver, steps: &[StepSpec]) -> Result<RunReport> {
    let mut report = RunReport::default();
    for step in steps {
        if !step.is_enabled() {
            info!(step = %step.id, "skipped (disabled)");
            report.skipped += 1;
            continue;
        }

        let outcome = match &step.details {
            StepDetails::Focus { selector } => driver.ensure_focused(selector).await,
            StepDetails::Fill { selector, text } => driver.fill_text(selector, text).await,
        };
        if let Err(err) = outcome {
            error!(step = %step.id, kind = err.kind(), error = %err, "step failed");
            return Err(err).with_context(|| format!("step `{}` failed", step.id));
        }

        info!(step = %step.id, "step done");
        report.executed += 1;
    }
    Ok(report)
}

/// Browser session the runner navigates, drives and finally closes.
#[async_trait]
pub trait BrowserSession: RemotePage + ActionChannel + Clone + 'static {
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn shutdown(self) -> Result<()>;
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.goto(url).await
    }

    async fn shutdown(self) -> Result<()> {
        self.close().await
    }
}

/// Open the browser, navigate, run the steps and close the session.
pub async fn run(cfg: PilotConfig, target_url: &str) -> Result<RunReport> {
    let session = WebDriverSession::connect(&webdriver_settings(&cfg.webdriver)).await?;
    run_session(session, &cfg, target_url).await
}

/// Drive an open session and close it on every path. The first error wins.
pub async fn run_session<S: BrowserSession>(
    session: S,
    cfg: &PilotConfig,
    target_url: &str,
) -> Result<RunReport> {
    let outcome = drive(&session, cfg, target_url).await;
    let closed = session.shutdown().await;

    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(err)) => Err(err.context("failed to close browser session")),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "session close failed after an earlier error");
            Err(err)
        }
    }
}

async fn drive<S: BrowserSession>(
    session: &S,
    cfg: &PilotConfig,
    target_url: &str,
) -> Result<RunReport> {
    session.navigate(target_url).await?;

    // Intents go through one executor so WebDriver sees them strictly in order.
    let (channel, intents) = DispatchChannel::new(DEFAULT_QUEUE);
    let executor = tokio::spawn(intents.serve(Arc::new(session.clone())));

    let driver = build_driver(cfg, Arc::new(channel), Arc::new(session.clone()));
    let outcome = run_steps(&driver, &cfg.steps).await;
    drop(driver);

    let forwarded = executor.await.context("intent executor panicked")?;
    info!(forwarded, "intent executor stopped");
    outcome
}

/// Human-readable summary for `--dry-run`.
pub fn describe_plan(cfg: &PilotConfig, target_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "target:    {target_url}");
    let _ = writeln!(out, "webdriver: {}", cfg.webdriver.url);
    let _ = writeln!(
        out,
        "timings:   focus_retry={}ms post_select={}ms post_delete={}ms",
        cfg.timings.focus_retry_ms, cfg.timings.post_select_ms, cfg.timings.post_delete_ms
    );
    for step in &cfg.steps {
        let state = if step.is_enabled() { "" } else { " (disabled)" };
        let line = match &step.details {
            StepDetails::Focus { selector } => format!("focus {selector}"),
            StepDetails::Fill { selector, text } => {
                format!("fill  {selector} ({} chars)", text.chars().count())
            }
        };
        let _ = writeln!(out, "  {:<12} {line}{state}", step.id);
    }
    out
}
