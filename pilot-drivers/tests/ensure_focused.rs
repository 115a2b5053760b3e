mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    click, polled, Broken, Call, Log, RecordingChannel, RecordingDelay, ScriptedPage,
};
use pilot_drivers::automation::{
    AutomationDriver, DriverError, DriverTimings, FocusPolicy, Intent,
};

fn driver(log: &Log, page: ScriptedPage) -> AutomationDriver {
    driver_with(log, page, RecordingChannel::new(log))
}

fn driver_with(log: &Log, page: ScriptedPage, channel: RecordingChannel) -> AutomationDriver {
    AutomationDriver::new(Arc::new(channel), Arc::new(page))
        .with_delay(Arc::new(RecordingDelay::new(log)))
}

#[tokio::test]
async fn already_focused_element_is_not_clicked() {
    let log = Log::default();
    let d = driver(&log, ScriptedPage::new(&log));

    d.ensure_focused("#email").await.unwrap();

    assert_eq!(log.calls(), vec![polled("#email", true)]);
}

#[tokio::test]
async fn clicks_once_per_unfocused_poll() {
    for n in [1usize, 2, 5] {
        let log = Log::default();
        let d = driver(&log, ScriptedPage::new(&log).unfocused_for(n));

        d.ensure_focused("#email").await.unwrap();

        assert_eq!(log.clicks(), n);
        let calls = log.calls();
        // Every click is followed by the retry wait and then another poll.
        for (i, call) in calls.iter().enumerate() {
            if *call == click("#email") {
                assert_eq!(calls[i + 1], Call::Wait(800));
                assert!(matches!(calls[i + 2], Call::IsSelected(_, _)));
            }
        }
        assert_eq!(calls.last(), Some(&polled("#email", true)));
    }
}

#[tokio::test]
async fn custom_retry_interval_is_used() {
    let log = Log::default();
    let d = driver(&log, ScriptedPage::new(&log).unfocused_for(1))
        .with_timings(DriverTimings::from_millis(1200, 300, 500));

    d.ensure_focused("#zip").await.unwrap();

    assert_eq!(
        log.calls(),
        vec![
            polled("#zip", false),
            click("#zip"),
            Call::Wait(1200),
            polled("#zip", true),
        ]
    );
}

#[tokio::test]
async fn attempt_limit_fails_with_focus_timeout() {
    let log = Log::default();
    let d = driver(&log, ScriptedPage::new(&log).never_focused())
        .with_focus_policy(FocusPolicy::attempts(3));

    let err = d.ensure_focused("#ghost").await.unwrap_err();

    match err {
        DriverError::FocusTimeout {
            selector, attempts, ..
        } => {
            assert_eq!(selector, "#ghost");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.clicks(), 3);
}

#[tokio::test(start_paused = true)]
async fn elapsed_limit_fails_with_focus_timeout() {
    let log = Log::default();
    let page = ScriptedPage::new(&log).never_focused();
    let d = AutomationDriver::new(Arc::new(RecordingChannel::new(&log)), Arc::new(page))
        .with_focus_policy(FocusPolicy {
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(4)),
        });

    let err = d.ensure_focused("#ghost").await.unwrap_err();

    match err {
        DriverError::FocusTimeout { elapsed, attempts, .. } => {
            assert!(elapsed >= Duration::from_secs(4));
            // 800 ms between polls: clicks at 0, 0.8, 1.6, 2.4, 3.2 s.
            assert_eq!(attempts, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unbounded_policy_keeps_clicking_until_focused() {
    let log = Log::default();
    let d = driver(&log, ScriptedPage::new(&log).unfocused_for(40))
        .with_focus_policy(FocusPolicy::unbounded());

    d.ensure_focused("#slow").await.unwrap();

    assert_eq!(log.clicks(), 40);
}

#[tokio::test]
async fn rejected_click_fails_without_retrying() {
    let log = Log::default();
    let page = ScriptedPage::new(&log).never_focused();
    let d = driver_with(&log, page, RecordingChannel::rejecting_clicks(&log))
        .with_focus_policy(FocusPolicy::unbounded());

    let err = d.ensure_focused("#email").await.unwrap_err();

    match err {
        DriverError::Channel { intent, reason } => {
            assert_eq!(intent, Intent::Click("#email".into()));
            assert_eq!(reason, "element not interactable");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.calls(), vec![polled("#email", false), click("#email")]);
}

#[tokio::test]
async fn focus_query_error_propagates_before_any_click() {
    let log = Log::default();
    let page = ScriptedPage::new(&log).breaking(Broken::FocusQuery);
    let d = driver(&log, page);

    let err = d.ensure_focused("#email").await.unwrap_err();

    assert!(matches!(err, DriverError::Remote(_)), "got {err}");
    assert_eq!(log.clicks(), 0);
    assert!(log.calls().is_empty());
}
