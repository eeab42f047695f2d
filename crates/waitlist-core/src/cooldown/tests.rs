use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::retry::RetryPolicy;
use crate::testing::{ok_json, rate_limited, status, ScriptedTransport};
use crate::waitlist::{MSG_EMAIL_INVALID, MSG_EMAIL_REQUIRED};

fn no_retry() -> RetryPolicy {
    let mut policy = RetryPolicy::standard();
    policy.max_retries = 0;
    policy
}

fn controller(
    transport: ScriptedTransport,
) -> (Arc<WaitlistClient<ScriptedTransport>>, CooldownController<ScriptedTransport>) {
    let client = Arc::new(WaitlistClient::with_policy(transport, no_retry()));
    let controller = CooldownController::new(Arc::clone(&client));
    (client, controller)
}

/// Wait for the next published state and return its countdown.
async fn next_countdown(rx: &mut watch::Receiver<CooldownState>) -> u64 {
    rx.changed().await.expect("controller alive");
    let countdown = rx.borrow_and_update().countdown;
    countdown
}

#[tokio::test(start_paused = true)]
async fn invalid_email_never_reaches_network() {
    let (client, ctl) = controller(ScriptedTransport::new(vec![]));

    let err = ctl.submit("not-an-email").await.unwrap_err();
    assert!(matches!(err, JoinError::Validation(MSG_EMAIL_INVALID)));
    let err = ctl.submit("   ").await.unwrap_err();
    assert!(matches!(err, JoinError::Validation(MSG_EMAIL_REQUIRED)));

    let state = ctl.state();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.error.as_deref(), Some(MSG_EMAIL_REQUIRED));
    assert!(!state.is_loading);
    assert_eq!(client.transport().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn success_sets_flag_and_clears_error() {
    let (_client, ctl) = controller(ScriptedTransport::new(vec![
        status(400),
        ok_json(json!({ "message": "Joined waitlist successfully" })),
    ]));

    assert!(ctl.submit("user@example.com").await.is_err());
    assert!(ctl.state().error.is_some());

    let res = ctl.submit("user@example.com").await.unwrap();
    assert_eq!(res.message, "Joined waitlist successfully");
    let state = ctl.state();
    assert_eq!(state.phase, Phase::Success);
    assert!(state.is_success);
    assert!(state.error.is_none());
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn plain_failure_records_message_and_reraises() {
    let (_client, ctl) = controller(ScriptedTransport::new(vec![status(409)]));

    let err = ctl.submit("user@example.com").await.unwrap_err();
    let info = err.error_info().expect("api error");
    assert_eq!(info.status_code, Some(409));
    assert!(!err.is_rate_limited());

    let state = ctl.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(
        state.error.as_deref(),
        Some("This email is already registered on the waitlist.")
    );
    assert!(!state.is_success);
    assert_eq!(state.countdown, 0);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_counts_down_then_accepts_submit() {
    let (client, ctl) = controller(ScriptedTransport::new(vec![
        rate_limited(Some("5")),
        ok_json(json!({ "message": "ok" })),
    ]));
    let mut rx = ctl.subscribe();

    let err = ctl.submit("user@example.com").await.unwrap_err();
    assert!(err.is_rate_limited());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.phase, Phase::RateLimited);
    assert_eq!(state.retry_after_seconds, Some(5));
    assert_eq!(state.countdown, 5);
    assert_eq!(
        state.error.as_deref(),
        Some("Too many requests. Please try again in 5 seconds.")
    );

    // Refused locally while counting down.
    let err = ctl.submit("user@example.com").await.unwrap_err();
    assert!(matches!(err, JoinError::CoolingDown { remaining_secs: 5 }));
    assert_eq!(
        ctl.state().error.as_deref(),
        Some("Please wait 5 seconds before trying again.")
    );
    assert_eq!(client.transport().calls(), 1);
    rx.borrow_and_update();

    let start = tokio::time::Instant::now();
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(next_countdown(&mut rx).await);
    }
    assert_eq!(seen, vec![4, 3, 2, 1, 0]);
    assert!(start.elapsed() >= Duration::from_secs(5));

    let state = ctl.state();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.retry_after_seconds, None);
    assert!(state.can_submit());

    ctl.submit("user@example.com").await.unwrap();
    assert_eq!(client.transport().calls(), 2);
    assert_eq!(ctl.state().phase, Phase::Success);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_header_uses_fallback() {
    let (_client, ctl) = controller(ScriptedTransport::new(vec![rate_limited(None)]));
    ctl.submit("user@example.com").await.unwrap_err();
    let state = ctl.state();
    assert_eq!(state.phase, Phase::RateLimited);
    assert_eq!(state.countdown, DEFAULT_RATE_LIMIT_FALLBACK_SECS);
    assert_eq!(state.retry_after_seconds, Some(DEFAULT_RATE_LIMIT_FALLBACK_SECS));
}

#[tokio::test(start_paused = true)]
async fn explicit_zero_retry_after_fails_without_fallback_countdown() {
    let (client, ctl) = controller(ScriptedTransport::new(vec![
        rate_limited(Some("0")),
        ok_json(json!({ "message": "ok" })),
    ]));

    let err = ctl.submit("user@example.com").await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.error_info().and_then(|i| i.retry_after_seconds), Some(0));
    let state = ctl.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.countdown, 0);
    assert!(state.retry_after_seconds.is_none());
    assert!(state.can_submit());

    // Nothing to wait out: the next submit goes straight to the network.
    ctl.submit("user@example.com").await.unwrap();
    assert_eq!(client.transport().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_header_and_no_fallback_just_fails() {
    let client = Arc::new(WaitlistClient::with_policy(
        ScriptedTransport::new(vec![rate_limited(None), rate_limited(Some("0"))]),
        no_retry(),
    ));
    let ctl = CooldownController::new(client).with_fallback_cooldown(0);

    for _ in 0..2 {
        let err = ctl.submit("user@example.com").await.unwrap_err();
        assert!(err.is_rate_limited());
        let state = ctl.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.countdown, 0);
        assert!(state.retry_after_seconds.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_inflight_and_ignores_late_result() {
    let (client, ctl) = controller(ScriptedTransport::gated(vec![
        ok_json(json!({ "message": "first" })),
        ok_json(json!({ "message": "second" })),
    ]));
    let transport = client.transport();

    let (res, ()) = tokio::join!(ctl.submit("user@example.com"), async {
        transport.wait_started().await;
        assert!(ctl.state().is_loading);
        assert_eq!(ctl.state().phase, Phase::Submitting);
        ctl.reset();
        // The response now arrives, after the cancel.
        transport.release();
    });
    assert!(matches!(res, Err(JoinError::Canceled)));
    assert_eq!(ctl.state(), CooldownState::default());

    // A fresh request is unaffected by the canceled one.
    transport.release();
    let res = ctl.submit("user@example.com").await.unwrap();
    assert_eq!(res.message, "first");
    assert_eq!(ctl.state().phase, Phase::Success);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_stops_countdown() {
    let (_client, ctl) = controller(ScriptedTransport::new(vec![rate_limited(Some("30"))]));
    ctl.submit("user@example.com").await.unwrap_err();
    assert_eq!(ctl.state().countdown, 30);

    ctl.reset();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(ctl.state(), CooldownState::default());
}

#[tokio::test(start_paused = true)]
async fn drop_stops_ticker() {
    let (_client, ctl) = controller(ScriptedTransport::new(vec![rate_limited(Some("10"))]));
    ctl.submit("user@example.com").await.unwrap_err();
    let mut rx = ctl.subscribe();
    rx.borrow_and_update();

    drop(ctl);
    // Sender goes away with the aborted ticker; no tick is ever published.
    assert!(rx.changed().await.is_err());
    assert_eq!(rx.borrow().countdown, 10);
}

#[tokio::test(start_paused = true)]
async fn controllers_sharing_a_client_are_independent() {
    let client = Arc::new(WaitlistClient::with_policy(
        ScriptedTransport::new(vec![rate_limited(Some("5")), ok_json(json!({ "message": "ok" }))]),
        no_retry(),
    ));
    let hero = CooldownController::new(Arc::clone(&client));
    let footer = CooldownController::new(Arc::clone(&client));

    hero.submit("a@example.com").await.unwrap_err();
    assert_eq!(hero.state().phase, Phase::RateLimited);

    footer.submit("b@example.com").await.unwrap();
    assert_eq!(footer.state().phase, Phase::Success);
    assert_eq!(hero.state().countdown, 5);
}

#[tokio::test(start_paused = true)]
async fn retries_happen_below_the_controller() {
    let client = Arc::new(WaitlistClient::new(ScriptedTransport::new(vec![
        status(503),
        status(503),
        ok_json(json!({ "message": "ok" })),
    ])));
    let ctl = CooldownController::new(Arc::clone(&client));
    ctl.submit("user@example.com").await.unwrap();
    assert_eq!(client.transport().calls(), 3);
}
