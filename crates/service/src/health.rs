//! Health tracking service with circuit breaker protection
//!
//! Maintains a three-state circuit (closed, open, half-open) per backend
//! name, driven entirely by recorded successes and failures. The
//! open-to-half-open transition is observed lazily on the next
//! `should_attempt` query once the reset timeout has elapsed; no background
//! timer is involved.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use sip_config::CircuitBreakerSettings;
use sip_types::{BackendHealthState, BackendMetrics, CircuitState, HealthSummary};
use tracing::{debug, info, warn};

/// Circuit breaker and request metrics, keyed by backend name
///
/// All state lives in process and is created lazily on first observation.
/// Unknown backend names are treated as healthy (fail-open for metadata,
/// not for actual requests).
#[derive(Debug)]
pub struct HealthTracker {
	config: CircuitBreakerSettings,
	states: DashMap<String, BackendHealthState>,
	metrics: DashMap<String, BackendMetrics>,
}

impl HealthTracker {
	/// Create a tracker with the given circuit breaker settings
	pub fn new(config: CircuitBreakerSettings) -> Self {
		Self {
			config,
			states: DashMap::new(),
			metrics: DashMap::new(),
		}
	}

	/// Create a tracker with default settings
	pub fn with_defaults() -> Self {
		Self::new(CircuitBreakerSettings::default())
	}

	fn reset_timeout(&self) -> Duration {
		Duration::milliseconds(self.config.reset_timeout_ms as i64)
	}

	/// Start tracking a backend in closed state
	pub fn register(&self, name: &str) {
		self.states
			.entry(name.to_string())
			.or_insert_with(|| BackendHealthState::new_closed(name.to_string()));
	}

	/// Stop tracking a backend, dropping its state and metrics
	pub fn remove(&self, name: &str) {
		self.states.remove(name);
		self.metrics.remove(name);
	}

	/// Drop all tracked state
	pub fn clear(&self) {
		self.states.clear();
		self.metrics.clear();
	}

	/// Names of all tracked backends
	pub fn tracked_names(&self) -> Vec<String> {
		self.states.iter().map(|e| e.key().clone()).collect()
	}

	/// Whether the backend's circuit is not open
	///
	/// Unknown backends are healthy by default.
	pub fn is_healthy(&self, name: &str) -> bool {
		self.states
			.get(name)
			.map(|state| state.is_healthy())
			.unwrap_or(true)
	}

	/// Current circuit state, if the backend is tracked
	pub fn state(&self, name: &str) -> Option<CircuitState> {
		self.states.get(name).map(|state| state.state)
	}

	/// Snapshot of the full health state, if tracked
	pub fn health(&self, name: &str) -> Option<BackendHealthState> {
		self.states.get(name).map(|state| state.clone())
	}

	/// Gate for dispatching a request to a backend
	///
	/// Returns true in closed and half-open. In open, performs the
	/// open-to-half-open transition as a side effect once the reset timeout
	/// has elapsed, then returns true; otherwise returns false. Unknown
	/// backends are allowed through.
	pub fn should_attempt(&self, name: &str) -> bool {
		let mut entry = match self.states.get_mut(name) {
			Some(entry) => entry,
			None => return true,
		};

		match entry.state {
			CircuitState::Closed | CircuitState::HalfOpen => true,
			CircuitState::Open => {
				if entry.should_attempt_reset(self.reset_timeout()) {
					entry.half_open();
					debug!("Circuit for backend '{}' moved to half-open", name);
					true
				} else {
					false
				}
			},
		}
	}

	/// Record a successful request with its measured latency
	pub fn record_success(&self, name: &str, latency_ms: u64) {
		let mut entry = self
			.states
			.entry(name.to_string())
			.or_insert_with(|| BackendHealthState::new_closed(name.to_string()));

		entry.consecutive_failures = 0;
		entry.consecutive_successes += 1;
		entry.touch();

		if entry.state == CircuitState::HalfOpen
			&& entry.consecutive_successes >= self.config.success_threshold
		{
			entry.close();
			info!("Circuit for backend '{}' closed - recovery complete", name);
		}
		drop(entry);

		self.record_metrics(name, latency_ms, true);
	}

	/// Record a failed request with its reason and measured latency
	pub fn record_failure(&self, name: &str, reason: &str, latency_ms: u64) {
		let mut entry = self
			.states
			.entry(name.to_string())
			.or_insert_with(|| BackendHealthState::new_closed(name.to_string()));

		entry.consecutive_successes = 0;
		entry.consecutive_failures += 1;
		entry.last_failure_reason = Some(reason.to_string());
		entry.last_failure_at = Some(Utc::now());
		entry.touch();

		match entry.state {
			CircuitState::HalfOpen => {
				entry.open(Some(reason.to_string()));
				warn!(
					"Circuit for backend '{}' reopened after half-open failure: {}",
					name, reason
				);
			},
			CircuitState::Closed => {
				if entry.consecutive_failures >= self.config.failure_threshold {
					let failures = entry.consecutive_failures;
					entry.open(Some(reason.to_string()));
					warn!(
						"Circuit for backend '{}' opened after {} consecutive failure(s): {}",
						name, failures, reason
					);
				}
			},
			CircuitState::Open => {},
		}
		drop(entry);

		self.record_metrics(name, latency_ms, false);
	}

	/// Manually open a backend's circuit, bypassing the failure threshold
	pub fn force_open(&self, name: &str, reason: Option<&str>) {
		let mut entry = self
			.states
			.entry(name.to_string())
			.or_insert_with(|| BackendHealthState::new_closed(name.to_string()));
		entry.open(reason.map(|r| r.to_string()));
		info!("Circuit for backend '{}' forced open", name);
	}

	/// Manually close a backend's circuit, bypassing the success threshold
	pub fn force_close(&self, name: &str) {
		let mut entry = self
			.states
			.entry(name.to_string())
			.or_insert_with(|| BackendHealthState::new_closed(name.to_string()));
		entry.close();
		info!("Circuit for backend '{}' forced closed", name);
	}

	/// Reset a backend to a fresh closed state and zero its metrics
	pub fn reset(&self, name: &str) {
		self.states
			.insert(name.to_string(), BackendHealthState::new_closed(name.to_string()));
		if let Some(mut metrics) = self.metrics.get_mut(name) {
			metrics.reset();
		}
	}

	/// Metrics snapshot for one backend, when metrics collection is enabled
	pub fn metrics(&self, name: &str) -> Option<BackendMetrics> {
		if !self.config.enable_metrics {
			return None;
		}
		self.metrics.get(name).map(|m| m.clone())
	}

	/// Health summaries for all tracked backends
	pub fn summary(&self) -> Vec<HealthSummary> {
		self.states
			.iter()
			.map(|entry| HealthSummary {
				backend: entry.key().clone(),
				state: entry.state,
				healthy: entry.is_healthy(),
				consecutive_failures: entry.consecutive_failures,
				last_failure_reason: entry.last_failure_reason.clone(),
				metrics: self.metrics(entry.key()),
			})
			.collect()
	}

	fn record_metrics(&self, name: &str, latency_ms: u64, success: bool) {
		if !self.config.enable_metrics {
			return;
		}
		let mut entry = self.metrics.entry(name.to_string()).or_default();
		if success {
			entry.record_success(latency_ms);
		} else {
			entry.record_failure(latency_ms);
		}
	}
}

impl Default for HealthTracker {
	fn default() -> Self {
		Self::with_defaults()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tracker_with(failure_threshold: u32, reset_timeout_ms: u64, success_threshold: u32) -> HealthTracker {
		HealthTracker::new(CircuitBreakerSettings {
			failure_threshold,
			reset_timeout_ms,
			success_threshold,
			enable_metrics: true,
		})
	}

	#[test]
	fn test_unknown_backend_is_healthy() {
		let tracker = HealthTracker::with_defaults();
		assert!(tracker.is_healthy("never-seen"));
		assert!(tracker.should_attempt("never-seen"));
		assert!(tracker.state("never-seen").is_none());
	}

	#[test]
	fn test_circuit_opens_at_failure_threshold() {
		let tracker = tracker_with(3, 30_000, 2);

		tracker.record_failure("pool", "timeout", 100);
		tracker.record_failure("pool", "timeout", 100);
		assert!(tracker.is_healthy("pool"));

		tracker.record_failure("pool", "timeout", 100);
		assert!(!tracker.is_healthy("pool"));
		assert_eq!(tracker.state("pool"), Some(CircuitState::Open));
		assert!(!tracker.should_attempt("pool"));
	}

	#[test]
	fn test_success_resets_failure_streak() {
		let tracker = tracker_with(3, 30_000, 2);

		tracker.record_failure("pool", "timeout", 100);
		tracker.record_failure("pool", "timeout", 100);
		tracker.record_success("pool", 50);
		tracker.record_failure("pool", "timeout", 100);
		tracker.record_failure("pool", "timeout", 100);

		// Streak was broken; circuit must still be closed
		assert_eq!(tracker.state("pool"), Some(CircuitState::Closed));
	}

	#[test]
	fn test_lazy_half_open_transition() {
		let tracker = tracker_with(1, 10, 2);

		tracker.record_failure("pool", "down", 100);
		assert_eq!(tracker.state("pool"), Some(CircuitState::Open));
		assert!(!tracker.should_attempt("pool"));

		std::thread::sleep(std::time::Duration::from_millis(20));

		// The elapsed timeout is observed on the query itself
		assert!(tracker.should_attempt("pool"));
		assert_eq!(tracker.state("pool"), Some(CircuitState::HalfOpen));
	}

	#[test]
	fn test_half_open_closes_after_success_threshold() {
		let tracker = tracker_with(1, 10, 2);

		tracker.record_failure("pool", "down", 100);
		std::thread::sleep(std::time::Duration::from_millis(20));
		assert!(tracker.should_attempt("pool"));

		tracker.record_success("pool", 40);
		assert_eq!(tracker.state("pool"), Some(CircuitState::HalfOpen));

		tracker.record_success("pool", 40);
		assert_eq!(tracker.state("pool"), Some(CircuitState::Closed));
	}

	#[test]
	fn test_half_open_failure_reopens() {
		let tracker = tracker_with(1, 10, 2);

		tracker.record_failure("pool", "down", 100);
		std::thread::sleep(std::time::Duration::from_millis(20));
		assert!(tracker.should_attempt("pool"));

		tracker.record_failure("pool", "still down", 100);
		assert_eq!(tracker.state("pool"), Some(CircuitState::Open));
		assert!(!tracker.should_attempt("pool"));
	}

	#[test]
	fn test_manual_overrides() {
		let tracker = HealthTracker::with_defaults();

		tracker.force_open("pool", Some("maintenance"));
		assert!(!tracker.is_healthy("pool"));

		tracker.force_close("pool");
		assert!(tracker.is_healthy("pool"));

		tracker.record_failure("pool", "blip", 10);
		tracker.reset("pool");
		let health = tracker.health("pool").unwrap();
		assert_eq!(health.consecutive_failures, 0);
		assert_eq!(health.state, CircuitState::Closed);
	}

	#[test]
	fn test_metrics_recorded_with_latency() {
		let tracker = HealthTracker::with_defaults();

		tracker.record_success("pool", 100);
		tracker.record_failure("pool", "timeout", 300);

		let metrics = tracker.metrics("pool").unwrap();
		assert_eq!(metrics.total_requests, 2);
		assert_eq!(metrics.successful_requests, 1);
		assert_eq!(metrics.failed_requests, 1);
		assert_eq!(metrics.min_latency_ms, Some(100));
		assert_eq!(metrics.max_latency_ms, Some(300));
	}

	#[test]
	fn test_metrics_disabled() {
		let tracker = HealthTracker::new(CircuitBreakerSettings {
			enable_metrics: false,
			..CircuitBreakerSettings::default()
		});

		tracker.record_success("pool", 100);
		assert!(tracker.metrics("pool").is_none());
	}

	#[test]
	fn test_unregister_drops_state() {
		let tracker = HealthTracker::with_defaults();
		tracker.register("pool");
		tracker.record_failure("pool", "x", 10);

		tracker.remove("pool");
		assert!(tracker.state("pool").is_none());
		assert!(tracker.is_healthy("pool"));
	}

	#[test]
	fn test_summary_covers_all_tracked() {
		let tracker = tracker_with(1, 30_000, 2);
		tracker.register("a");
		tracker.record_failure("b", "down", 10);

		let mut summary = tracker.summary();
		summary.sort_by(|x, y| x.backend.cmp(&y.backend));

		assert_eq!(summary.len(), 2);
		assert!(summary[0].healthy);
		assert!(!summary[1].healthy);
		assert_eq!(summary[1].last_failure_reason.as_deref(), Some("down"));
	}
}
