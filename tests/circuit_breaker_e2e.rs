//! Circuit breaker lifecycle exercised through the dispatch stack

use std::sync::Arc;
use std::time::Duration;

use sip_dispatch::mocks::MockBackend;
use sip_dispatch::{
	BackendRegistry, CircuitBreakerSettings, CircuitState, HealthTracker, RegisterOptions, Router,
	RouterConfig, SmartRouter, TransferParams,
};

fn transfer() -> TransferParams {
	TransferParams::new("solana", "SOL", 1.0, "alice", "bob")
}

fn registry_with_breaker(settings: CircuitBreakerSettings) -> Arc<BackendRegistry> {
	Arc::new(
		BackendRegistry::builder()
			.with_health_tracker(Arc::new(HealthTracker::new(settings)))
			.build(),
	)
}

#[tokio::test]
async fn three_failures_open_the_circuit_with_defaults() {
	let registry = registry_with_breaker(CircuitBreakerSettings::default());
	registry
		.register(
			Arc::new(MockBackend::failing("flaky")),
			RegisterOptions::default(),
		)
		.unwrap();

	let router = SmartRouter::new(Arc::clone(&registry));
	for _ in 0..3 {
		let _ = router.execute(&transfer(), &RouterConfig::default()).await;
	}

	assert!(!registry.is_healthy("flaky"));
	let health = registry.backend_health("flaky").unwrap();
	assert_eq!(health.state, CircuitState::Open);
	assert_eq!(health.consecutive_failures, 3);
	assert_eq!(health.last_failure_reason.as_deref(), Some("simulated failure"));
}

#[tokio::test]
async fn open_circuit_recovers_through_half_open() {
	let settings = CircuitBreakerSettings {
		failure_threshold: 1,
		reset_timeout_ms: 50,
		success_threshold: 2,
		enable_metrics: true,
	};
	let registry = registry_with_breaker(settings);
	registry
		.register(Arc::new(MockBackend::new("pool")), RegisterOptions::default())
		.unwrap();

	registry.record_failure("pool", "blip", 100);
	assert!(!registry.is_healthy("pool"));
	assert!(!registry.should_attempt("pool"));

	tokio::time::sleep(Duration::from_millis(80)).await;

	// The elapsed reset timeout is observed lazily on the next query
	assert!(registry.should_attempt("pool"));
	assert_eq!(
		registry.backend_health("pool").unwrap().state,
		CircuitState::HalfOpen
	);

	// Two successes close the circuit again
	registry.record_success("pool", 40);
	registry.record_success("pool", 40);
	assert_eq!(
		registry.backend_health("pool").unwrap().state,
		CircuitState::Closed
	);
}

#[tokio::test]
async fn half_open_failure_goes_straight_back_to_open() {
	let settings = CircuitBreakerSettings {
		failure_threshold: 1,
		reset_timeout_ms: 50,
		success_threshold: 2,
		enable_metrics: false,
	};
	let registry = registry_with_breaker(settings);
	registry
		.register(Arc::new(MockBackend::new("pool")), RegisterOptions::default())
		.unwrap();

	registry.record_failure("pool", "blip", 100);
	tokio::time::sleep(Duration::from_millis(80)).await;
	assert!(registry.should_attempt("pool"));

	registry.record_failure("pool", "still broken", 100);
	assert_eq!(
		registry.backend_health("pool").unwrap().state,
		CircuitState::Open
	);
	assert!(!registry.should_attempt("pool"));
}

#[tokio::test]
async fn recovered_backend_serves_traffic_again() {
	let settings = CircuitBreakerSettings {
		failure_threshold: 2,
		reset_timeout_ms: 50,
		success_threshold: 1,
		enable_metrics: true,
	};
	let registry = registry_with_breaker(settings);
	registry
		.register(Arc::new(MockBackend::new("pool")), RegisterOptions::default())
		.unwrap();

	// Drive the circuit open, wait out the timeout, then let a healthy
	// execution close it
	registry.record_failure("pool", "outage", 100);
	registry.record_failure("pool", "outage", 100);
	assert!(!registry.is_healthy("pool"));

	tokio::time::sleep(Duration::from_millis(80)).await;
	assert!(registry.should_attempt("pool"));

	let router = SmartRouter::new(Arc::clone(&registry));
	let receipt = router
		.execute(&transfer(), &RouterConfig::default())
		.await
		.unwrap();

	assert!(receipt.success);
	assert_eq!(
		registry.backend_health("pool").unwrap().state,
		CircuitState::Closed
	);
}

#[tokio::test]
async fn manual_overrides_bypass_thresholds() {
	let registry = registry_with_breaker(CircuitBreakerSettings::default());
	registry
		.register(Arc::new(MockBackend::new("pool")), RegisterOptions::default())
		.unwrap();

	registry.open_circuit("pool", Some("planned maintenance"));
	assert!(!registry.is_healthy("pool"));
	assert_eq!(
		registry
			.backend_health("pool")
			.unwrap()
			.last_failure_reason
			.as_deref(),
		Some("planned maintenance")
	);

	registry.close_circuit("pool");
	assert!(registry.is_healthy("pool"));

	registry.record_failure("pool", "one-off", 10);
	registry.reset_health("pool");
	let health = registry.backend_health("pool").unwrap();
	assert_eq!(health.consecutive_failures, 0);
	assert_eq!(health.state, CircuitState::Closed);
}

#[tokio::test]
async fn metrics_capture_latency_extremes() {
	let registry = registry_with_breaker(CircuitBreakerSettings::default());
	registry
		.register(Arc::new(MockBackend::new("pool")), RegisterOptions::default())
		.unwrap();

	registry.record_success("pool", 20);
	registry.record_success("pool", 200);
	registry.record_failure("pool", "timeout", 110);

	let metrics = registry.backend_metrics("pool").unwrap();
	assert_eq!(metrics.total_requests, 3);
	assert_eq!(metrics.successful_requests, 2);
	assert_eq!(metrics.failed_requests, 1);
	assert_eq!(metrics.min_latency_ms, Some(20));
	assert_eq!(metrics.max_latency_ms, Some(200));
	assert_eq!(metrics.total_latency_ms, 330);
	assert!((metrics.avg_latency_ms - 110.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn health_summary_reflects_the_fleet() {
	let registry = registry_with_breaker(CircuitBreakerSettings::default());
	for name in ["a", "b"] {
		registry
			.register(Arc::new(MockBackend::new(name)), RegisterOptions::default())
			.unwrap();
	}
	registry.open_circuit("b", None);

	let mut summary = registry.health_summary();
	summary.sort_by(|x, y| x.backend.cmp(&y.backend));

	assert_eq!(summary.len(), 2);
	assert!(summary[0].healthy);
	assert!(!summary[1].healthy);
}
