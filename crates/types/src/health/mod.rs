//! Health tracking types and core data structures
//!
//! This module provides the data structures behind the circuit breaker
//! protecting each backend, plus the optional per-backend request metrics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Circuit breaker state machine states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CircuitState {
	/// Normal operation - allow all requests
	Closed,
	/// Block requests - backend is failing
	Open,
	/// Testing recovery - requests allowed, watched closely
	HalfOpen,
}

/// Per-backend circuit breaker state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendHealthState {
	/// Backend name this circuit protects
	pub backend: String,

	/// Current state of the circuit
	pub state: CircuitState,

	/// Consecutive failures observed since the last success
	pub consecutive_failures: u32,

	/// Consecutive successes observed since the last failure
	pub consecutive_successes: u32,

	/// Most recent failure description
	pub last_failure_reason: Option<String>,

	/// When the most recent failure happened
	pub last_failure_at: Option<DateTime<Utc>>,

	/// When the circuit was opened (None if not currently open)
	pub opened_at: Option<DateTime<Utc>>,

	/// When this state was created
	pub created_at: DateTime<Utc>,

	/// When this state was last updated
	pub last_updated: DateTime<Utc>,
}

impl BackendHealthState {
	/// Create a new health state in closed position
	pub fn new_closed(backend: String) -> Self {
		let now = Utc::now();
		Self {
			backend,
			state: CircuitState::Closed,
			consecutive_failures: 0,
			consecutive_successes: 0,
			last_failure_reason: None,
			last_failure_at: None,
			opened_at: None,
			created_at: now,
			last_updated: now,
		}
	}

	/// Healthy means the circuit is not open
	pub fn is_healthy(&self) -> bool {
		self.state != CircuitState::Open
	}

	/// Check if an open circuit has waited out its reset timeout
	pub fn should_attempt_reset(&self, reset_timeout: Duration) -> bool {
		match self.state {
			CircuitState::Open => match self.opened_at {
				Some(opened_at) => Utc::now() >= opened_at + reset_timeout,
				None => false,
			},
			_ => false,
		}
	}

	/// Move the circuit to open, stamping the open time
	pub fn open(&mut self, reason: Option<String>) {
		self.state = CircuitState::Open;
		self.opened_at = Some(Utc::now());
		self.consecutive_successes = 0;
		if reason.is_some() {
			self.last_failure_reason = reason;
		}
		self.touch();
	}

	/// Move the circuit to half-open for recovery testing
	pub fn half_open(&mut self) {
		self.state = CircuitState::HalfOpen;
		self.opened_at = None;
		self.consecutive_successes = 0;
		self.consecutive_failures = 0;
		self.touch();
	}

	/// Move the circuit to closed, clearing failure bookkeeping
	pub fn close(&mut self) {
		self.state = CircuitState::Closed;
		self.opened_at = None;
		self.consecutive_failures = 0;
		self.consecutive_successes = 0;
		self.touch();
	}

	/// Update the last_updated timestamp
	pub fn touch(&mut self) {
		self.last_updated = Utc::now();
	}
}

/// Per-backend request metrics, strictly additive except on reset
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackendMetrics {
	/// Total number of recorded requests
	pub total_requests: u64,

	/// Number of successful requests
	pub successful_requests: u64,

	/// Number of failed requests
	pub failed_requests: u64,

	/// Cumulative latency across all requests, in milliseconds
	pub total_latency_ms: u64,

	/// Average latency in milliseconds
	pub avg_latency_ms: f64,

	/// Fastest observed request
	pub min_latency_ms: Option<u64>,

	/// Slowest observed request
	pub max_latency_ms: Option<u64>,

	/// When the last request was recorded
	pub last_request_at: Option<DateTime<Utc>>,

	/// When the last successful request was recorded
	pub last_success_at: Option<DateTime<Utc>>,
}

impl BackendMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a successful request
	pub fn record_success(&mut self, latency_ms: u64) {
		self.record_latency(latency_ms);
		self.successful_requests += 1;
		self.last_success_at = Some(Utc::now());
	}

	/// Record a failed request
	pub fn record_failure(&mut self, latency_ms: u64) {
		self.record_latency(latency_ms);
		self.failed_requests += 1;
	}

	fn record_latency(&mut self, latency_ms: u64) {
		self.total_requests += 1;
		self.total_latency_ms += latency_ms;
		self.avg_latency_ms = self.total_latency_ms as f64 / self.total_requests as f64;
		self.min_latency_ms = Some(match self.min_latency_ms {
			Some(min) => min.min(latency_ms),
			None => latency_ms,
		});
		self.max_latency_ms = Some(match self.max_latency_ms {
			Some(max) => max.max(latency_ms),
			None => latency_ms,
		});
		self.last_request_at = Some(Utc::now());
	}

	/// Reset all counters
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}

/// Combined health snapshot for one backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSummary {
	/// Backend name
	pub backend: String,

	/// Current circuit state
	pub state: CircuitState,

	/// Derived health flag (state != open)
	pub healthy: bool,

	/// Consecutive failures since the last success
	pub consecutive_failures: u32,

	/// Most recent failure description
	pub last_failure_reason: Option<String>,

	/// Request metrics when metrics collection is enabled
	pub metrics: Option<BackendMetrics>,
}
