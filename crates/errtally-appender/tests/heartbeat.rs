#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::sleep;

use errtally_appender::config::HeartbeatConfig;
use errtally_appender::heartbeat::heartbeat_fingerprint;
use errtally_appender::Heartbeat;
use errtally_core::{CounterRegistry, CounterTags};

fn heartbeat(initial_delay_seconds: u64, value: i64) -> (Arc<CounterRegistry>, Heartbeat) {
    let registry = Arc::new(CounterRegistry::new());
    let cfg = HeartbeatConfig {
        enabled: true,
        interval_seconds: 60,
        initial_delay_seconds,
        value,
    };
    let hb = Heartbeat::new(
        Arc::clone(&registry),
        CounterTags::new("checkout", "errors"),
        cfg,
    );
    (registry, hb)
}

fn sentinel(registry: &CounterRegistry, hb: &Heartbeat) -> Option<i64> {
    registry.get(hb.counter_key()).map(|c| c.value())
}

#[tokio::test(start_paused = true)]
async fn one_tick_writes_the_configured_value_once() {
    let (registry, hb) = heartbeat(60, 7);
    assert!(hb.start().unwrap());

    sleep(Duration::from_secs(61)).await;
    assert_eq!(hb.ticks(), 1);
    assert_eq!(sentinel(&registry, &hb), Some(7));

    // later ticks rewrite the same constant instead of accumulating
    sleep(Duration::from_secs(60)).await;
    assert_eq!(hb.ticks(), 2);
    assert_eq!(sentinel(&registry, &hb), Some(7));

    hb.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_before_first_tick_emits_nothing() {
    let (registry, hb) = heartbeat(60, 7);
    hb.start().unwrap();
    hb.stop();

    sleep(Duration::from_secs(300)).await;
    assert_eq!(hb.ticks(), 0);
    assert_eq!(sentinel(&registry, &hb), None);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_start_does_not_add_a_second_timer() {
    let (_registry, hb) = heartbeat(60, 0);
    assert!(hb.start().unwrap());
    assert!(!hb.start().unwrap());

    sleep(Duration::from_secs(61)).await;
    assert_eq!(hb.ticks(), 1);
    hb.stop();
}

#[tokio::test(start_paused = true)]
async fn zero_initial_delay_ticks_immediately() {
    let (registry, hb) = heartbeat(0, 0);
    hb.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    assert_eq!(hb.ticks(), 1);
    assert_eq!(sentinel(&registry, &hb), Some(0));
    hb.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_restart_works() {
    let (_registry, hb) = heartbeat(60, 0);
    hb.stop();

    hb.start().unwrap();
    sleep(Duration::from_secs(61)).await;
    hb.stop();
    hb.stop();
    assert!(!hb.is_scheduled());

    sleep(Duration::from_secs(120)).await;
    assert_eq!(hb.ticks(), 1);

    assert!(hb.start().unwrap());
    sleep(Duration::from_secs(61)).await;
    assert_eq!(hb.ticks(), 2);
    hb.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_start_and_stop_leave_a_consistent_slot() {
    let (_registry, hb) = heartbeat(3600, 0);
    let hb = Arc::new(hb);

    for _ in 0..50 {
        let calls = (0..16).map(|i| {
            let hb = Arc::clone(&hb);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    hb.start().unwrap();
                } else {
                    hb.stop();
                }
            })
        });
        for call in join_all(calls).await {
            call.unwrap();
        }

        // the reported outcome of a start always matches the slot
        let was_scheduled = hb.is_scheduled();
        assert_eq!(hb.start().unwrap(), !was_scheduled);
        assert!(hb.is_scheduled());
        hb.stop();
        assert!(!hb.is_scheduled());
        assert!(hb.start().unwrap());
        assert!(!hb.start().unwrap());
        hb.stop();
    }
}

#[tokio::test(start_paused = true)]
async fn heartbeats_with_different_tags_keep_separate_counters() {
    let registry = Arc::new(CounterRegistry::new());
    let cfg = HeartbeatConfig {
        enabled: true,
        interval_seconds: 60,
        initial_delay_seconds: 0,
        value: 1,
    };
    let checkout = Heartbeat::new(
        Arc::clone(&registry),
        CounterTags::new("checkout", "errors"),
        cfg.clone(),
    );
    let payments = Heartbeat::new(
        Arc::clone(&registry),
        CounterTags::new("payments", "errors"),
        cfg,
    );
    checkout.start().unwrap();
    payments.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.len(), 2);
    let subsystems: Vec<String> = registry
        .snapshot()
        .into_iter()
        .map(|s| {
            assert_eq!(s.fingerprint, heartbeat_fingerprint());
            s.subsystem.to_string()
        })
        .collect();
    assert_eq!(subsystems, vec!["checkout", "payments"]);

    checkout.stop();
    payments.stop();
}
