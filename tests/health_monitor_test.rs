//! Integration tests for the liveness monitor
//!
//! Drives the probe loop against a mock backend to verify the healthy/offline
//! transitions, the single recovery notification per outage, and the
//! start/stop lifecycle.

use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bigdataops_client::{ClientConfig, ClientEvent, HealthMonitor, Notifier, NoticeLevel};

fn monitor_config(server_uri: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = format!("{}/api", server_uri);
    config.health.probe_timeout_ms = 300;
    config.health.interval_secs = 30;
    config
}

fn healthy_body() -> serde_json::Value {
    json!({"code": 0, "msg": "success", "data": null, "status": "healthy"})
}

#[tokio::test]
async fn test_monitor_starts_optimistic() {
    let config = monitor_config("http://localhost:9");
    let monitor = HealthMonitor::new(&config, Notifier::new()).expect("monitor build");

    assert!(monitor.is_healthy());
    assert!(monitor.last_checked_at().is_none());
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn test_probe_accepts_healthy_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");
    monitor.check_now().await;

    assert!(monitor.is_healthy());
    assert!(monitor.last_checked_at().is_some());
}

#[tokio::test]
async fn test_probe_accepts_envelope_success_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "msg": "ok", "data": null})),
        )
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");
    monitor.check_now().await;

    assert!(monitor.is_healthy());
}

#[tokio::test]
async fn test_probe_rejects_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");
    monitor.check_now().await;

    assert!(!monitor.is_healthy());
    assert!(monitor.last_checked_at().is_some());
}

#[tokio::test]
async fn test_probe_timeout_lands_as_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(healthy_body())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let mut config = monitor_config(&server.uri());
    config.health.probe_timeout_ms = 100;

    let monitor = HealthMonitor::new(&config, Notifier::new()).expect("monitor build");
    // Must settle as a value, never a panic or rejection
    monitor.check_now().await;

    assert!(!monitor.is_healthy());
}

#[tokio::test]
async fn test_probe_sends_no_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");
    monitor.check_now().await;

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_single_recovery_notification_per_outage() {
    let server = MockServer::start().await;

    // Two failing probes, then the backend comes back
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let notifier = Notifier::new();
    let mut events = notifier.subscribe();
    let monitor =
        HealthMonitor::new(&monitor_config(&server.uri()), notifier).expect("monitor build");

    // unhealthy, unhealthy, healthy, healthy
    monitor.check_now().await;
    assert!(!monitor.is_healthy());
    monitor.check_now().await;
    assert!(!monitor.is_healthy());
    monitor.check_now().await;
    assert!(monitor.is_healthy());
    monitor.check_now().await;
    assert!(monitor.is_healthy());

    // Exactly one notice for the whole sequence: the recovery
    match events.try_recv() {
        Ok(ClientEvent::Notice(notice)) => {
            assert_eq!(notice.level, NoticeLevel::Success);
            assert!(notice.message.contains("restored"));
        }
        other => panic!("expected recovery notice, got {:?}", other),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // A stable healthy backend stays quiet
    for _ in 0..10 {
        monitor.check_now().await;
    }
    assert!(monitor.is_healthy());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_concurrent_checks_emit_one_recovery_notification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(healthy_body())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let mut config = monitor_config(&server.uri());
    config.health.probe_timeout_ms = 1000;

    let notifier = Notifier::new();
    let mut events = notifier.subscribe();
    let monitor = HealthMonitor::new(&config, notifier).expect("monitor build");

    monitor.check_now().await;
    assert!(!monitor.is_healthy());

    // Two checks racing across the same recovery must report it once
    tokio::join!(monitor.check_now(), monitor.check_now());
    assert!(monitor.is_healthy());

    match events.try_recv() {
        Ok(ClientEvent::Notice(notice)) => {
            assert_eq!(notice.level, NoticeLevel::Success);
            assert!(notice.message.contains("restored"));
        }
        other => panic!("expected recovery notice, got {:?}", other),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_unreachable_backend_raises_no_notice() {
    // Nothing is listening on this base URL
    let config = monitor_config("http://127.0.0.1:1");

    let notifier = Notifier::new();
    let mut events = notifier.subscribe();
    let monitor = HealthMonitor::new(&config, notifier).expect("monitor build");

    monitor.check_now().await;

    assert!(!monitor.is_healthy());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_start_probes_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");

    monitor.start();
    assert!(monitor.is_running());

    // First probe fires on start, not after the first 30s interval
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(monitor.last_checked_at().is_some());

    monitor.stop().await;
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn test_start_twice_spawns_one_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");

    monitor.start();
    monitor.start();
    tokio::time::sleep(Duration::from_millis(500)).await;
    monitor.stop().await;

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1, "second start must not add a probe loop");
}

#[tokio::test]
async fn test_restart_resumes_with_immediate_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");

    monitor.start();
    tokio::time::sleep(Duration::from_millis(400)).await;
    monitor.stop().await;

    let probes_before = server
        .received_requests()
        .await
        .expect("recorded requests")
        .len();
    assert_eq!(probes_before, 1);

    // Stopped means stopped: no probes while down
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        server
            .received_requests()
            .await
            .expect("recorded requests")
            .len(),
        probes_before
    );

    monitor.start();
    tokio::time::sleep(Duration::from_millis(400)).await;
    monitor.stop().await;

    let probes_after = server
        .received_requests()
        .await
        .expect("recorded requests")
        .len();
    assert_eq!(probes_after, probes_before + 1);
}

#[tokio::test]
async fn test_restart_after_stop_with_request_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(healthy_body())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let mut config = monitor_config(&server.uri());
    config.health.probe_timeout_ms = 1000;
    config.health.interval_secs = 1;

    let monitor = HealthMonitor::new(&config, Notifier::new()).expect("monitor build");

    // Stop while the backend is still holding the initial request open; the
    // in-flight check completes and the loop exits on its own.
    monitor.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop().await;
    assert!(!monitor.is_running());

    let requests_before = server
        .received_requests()
        .await
        .expect("recorded requests")
        .len();

    // The restarted schedule keeps going: one check immediately, then one
    // per interval
    monitor.start();
    tokio::time::sleep(Duration::from_millis(2600)).await;
    assert!(monitor.is_running());

    let requests_after = server
        .received_requests()
        .await
        .expect("recorded requests")
        .len();
    assert!(
        requests_after >= requests_before + 2,
        "restarted monitor went quiet: {} requests before restart, {} after",
        requests_before,
        requests_after
    );

    monitor.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let monitor = HealthMonitor::new(&monitor_config(&server.uri()), Notifier::new())
        .expect("monitor build");

    monitor.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    monitor.stop().await;
    monitor.stop().await;

    assert!(!monitor.is_running());
}

#[tokio::test]
async fn test_scheduled_probes_follow_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(healthy_body()))
        .mount(&server)
        .await;

    let mut config = monitor_config(&server.uri());
    config.health.interval_secs = 1;

    let monitor = HealthMonitor::new(&config, Notifier::new()).expect("monitor build");
    monitor.start();
    tokio::time::sleep(Duration::from_millis(1_600)).await;
    monitor.stop().await;

    let probes = server
        .received_requests()
        .await
        .expect("recorded requests")
        .len();
    assert!(probes >= 2, "expected immediate probe plus at least one tick, got {}", probes);
}
