//! Backend registry: composition root and query surface
//!
//! Owns the set of registered backends plus an optional health tracker and
//! optional rate limiter, and composes their independent filters into
//! layered views. The registry works correctly with either or both
//! subsystems absent: the corresponding mutators become no-ops and the
//! corresponding filters become permissive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use sip_config::{RateLimiterSettings, Settings};
use sip_types::{
	AcquireOptions, BackendHealthState, BackendMetrics, BackendType, HealthSummary,
	RateLimitResult, RateLimitStats, RegistryError, TransferBackend,
};
use tracing::{debug, info, warn};

use crate::health::HealthTracker;
use crate::rate_limit::RateLimiter;

/// A backend plus its registration bookkeeping
#[derive(Debug, Clone)]
pub struct RegisteredBackend {
	/// The backend itself
	pub backend: Arc<dyn TransferBackend>,

	/// Higher priority wins ordering ties
	pub priority: i32,

	/// Disabled backends are excluded from every query
	pub enabled: bool,

	/// When the backend was registered
	pub registered_at: DateTime<Utc>,

	/// Insertion sequence, breaking priority ties deterministically
	seq: u64,
}

/// Options for registering a backend
#[derive(Debug, Clone, Copy)]
pub struct RegisterOptions {
	/// Replace an existing backend with the same name
	pub replace: bool,

	/// Registration priority (higher wins ties)
	pub priority: i32,

	/// Register in enabled state
	pub enabled: bool,
}

impl Default for RegisterOptions {
	fn default() -> Self {
		Self {
			replace: false,
			priority: 0,
			enabled: true,
		}
	}
}

/// Builder for composing a registry with optional subsystems
#[derive(Default)]
pub struct RegistryBuilder {
	health: Option<Arc<HealthTracker>>,
	rate_limiter: Option<Arc<RateLimiter>>,
}

impl RegistryBuilder {
	pub fn with_health_tracker(mut self, tracker: Arc<HealthTracker>) -> Self {
		self.health = Some(tracker);
		self
	}

	pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.rate_limiter = Some(limiter);
		self
	}

	pub fn build(self) -> BackendRegistry {
		BackendRegistry {
			backends: RwLock::new(HashMap::new()),
			seq: AtomicU64::new(0),
			health: self.health,
			rate_limiter: self.rate_limiter,
		}
	}
}

/// Registry of execution backends keyed by unique name
pub struct BackendRegistry {
	backends: RwLock<HashMap<String, RegisteredBackend>>,
	seq: AtomicU64,
	health: Option<Arc<HealthTracker>>,
	rate_limiter: Option<Arc<RateLimiter>>,
}

impl BackendRegistry {
	/// Create a bare registry with no health tracking or rate limiting
	pub fn new() -> Self {
		RegistryBuilder::default().build()
	}

	/// Start composing a registry with optional subsystems
	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::default()
	}

	/// Create a registry with both subsystems configured from settings
	pub fn from_settings(settings: &Settings) -> Self {
		Self::builder()
			.with_health_tracker(Arc::new(HealthTracker::new(settings.circuit_breaker.clone())))
			.with_rate_limiter(Arc::new(RateLimiter::new(settings.rate_limiter.clone())))
			.build()
	}

	/// The attached health tracker, if any
	pub fn health_tracker(&self) -> Option<&Arc<HealthTracker>> {
		self.health.as_ref()
	}

	/// The attached rate limiter, if any
	pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
		self.rate_limiter.as_ref()
	}

	fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegisteredBackend>> {
		match self.backends.read() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegisteredBackend>> {
		match self.backends.write() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	/// Register a backend under its unique name
	///
	/// Fails when the name is already taken and `replace` is not set. The
	/// name is also registered with the attached health tracker.
	pub fn register(
		&self,
		backend: Arc<dyn TransferBackend>,
		options: RegisterOptions,
	) -> Result<(), RegistryError> {
		let name = backend.name().to_string();

		if backend.interface_version().is_none() {
			warn!(
				"Backend '{}' does not declare an interface version; assuming v1 (deprecated)",
				name
			);
		}

		{
			let mut backends = self.write();
			if backends.contains_key(&name) && !options.replace {
				return Err(RegistryError::DuplicateBackend { name });
			}

			backends.insert(
				name.clone(),
				RegisteredBackend {
					backend,
					priority: options.priority,
					enabled: options.enabled,
					registered_at: Utc::now(),
					seq: self.seq.fetch_add(1, Ordering::Relaxed),
				},
			);
		}

		if let Some(health) = &self.health {
			health.register(&name);
		}

		info!(
			"Registered backend '{}' (priority {}, enabled: {})",
			name, options.priority, options.enabled
		);
		Ok(())
	}

	/// Remove a backend along with its health and rate-limit state
	pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
		let removed = self.write().remove(name);
		if removed.is_none() {
			return Err(RegistryError::UnknownBackend {
				name: name.to_string(),
			});
		}

		if let Some(health) = &self.health {
			health.remove(name);
		}
		if let Some(limiter) = &self.rate_limiter {
			limiter.remove(name);
		}

		info!("Unregistered backend '{}'", name);
		Ok(())
	}

	/// Re-enable a disabled backend
	pub fn enable(&self, name: &str) -> Result<(), RegistryError> {
		self.update_entry(name, |entry| entry.enabled = true)
	}

	/// Disable a backend without unregistering it
	pub fn disable(&self, name: &str) -> Result<(), RegistryError> {
		self.update_entry(name, |entry| entry.enabled = false)
	}

	/// Change a backend's priority
	pub fn set_priority(&self, name: &str, priority: i32) -> Result<(), RegistryError> {
		self.update_entry(name, |entry| entry.priority = priority)
	}

	fn update_entry(
		&self,
		name: &str,
		update: impl FnOnce(&mut RegisteredBackend),
	) -> Result<(), RegistryError> {
		let mut backends = self.write();
		match backends.get_mut(name) {
			Some(entry) => {
				update(entry);
				Ok(())
			},
			None => Err(RegistryError::UnknownBackend {
				name: name.to_string(),
			}),
		}
	}

	/// Look up a backend by name, enabled or not
	pub fn get(&self, name: &str) -> Option<Arc<dyn TransferBackend>> {
		self.read().get(name).map(|entry| Arc::clone(&entry.backend))
	}

	/// Registration record for a backend, enabled or not
	pub fn entry(&self, name: &str) -> Option<RegisteredBackend> {
		self.read().get(name).cloned()
	}

	/// Number of registered backends, enabled or not
	pub fn count(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	/// Names of all registered backends
	pub fn names(&self) -> Vec<String> {
		self.read().keys().cloned().collect()
	}

	/// All enabled backends, highest priority first
	///
	/// Ties are broken by registration order.
	pub fn get_all(&self) -> Vec<Arc<dyn TransferBackend>> {
		let mut entries: Vec<RegisteredBackend> = self
			.read()
			.values()
			.filter(|entry| entry.enabled)
			.cloned()
			.collect();
		entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
		entries.into_iter().map(|entry| entry.backend).collect()
	}

	/// Enabled backends supporting a chain
	pub fn get_by_chain(&self, chain: &str) -> Vec<Arc<dyn TransferBackend>> {
		self.get_all()
			.into_iter()
			.filter(|backend| backend.supports_chain(chain))
			.collect()
	}

	/// Enabled backends matching a type exactly, plus `Both` backends
	pub fn get_by_type(&self, backend_type: BackendType) -> Vec<Arc<dyn TransferBackend>> {
		self.get_all()
			.into_iter()
			.filter(|backend| {
				let t = backend.backend_type();
				t == backend_type || t == BackendType::Both
			})
			.collect()
	}

	/// Enabled backends supporting viewing-key disclosure
	pub fn get_compliant(&self) -> Vec<Arc<dyn TransferBackend>> {
		self.get_all()
			.into_iter()
			.filter(|backend| backend.capabilities().compliance_support)
			.collect()
	}

	/// Enabled backends whose circuit is not open
	///
	/// Identical to `get_all` when health tracking is disabled.
	pub fn get_healthy(&self) -> Vec<Arc<dyn TransferBackend>> {
		let all = self.get_all();
		match &self.health {
			Some(health) => all
				.into_iter()
				.filter(|backend| health.is_healthy(backend.name()))
				.collect(),
			None => all,
		}
	}

	/// Enabled backends with rate-limit capacity for one request
	///
	/// Identical to `get_all` when rate limiting is disabled.
	pub fn get_available(&self) -> Vec<Arc<dyn TransferBackend>> {
		let all = self.get_all();
		match &self.rate_limiter {
			Some(limiter) => all
				.into_iter()
				.filter(|backend| limiter.can_acquire(backend.name(), 1))
				.collect(),
			None => all,
		}
	}

	/// Enabled backends that are both healthy and not throttled
	pub fn get_ready(&self) -> Vec<Arc<dyn TransferBackend>> {
		self.get_healthy()
			.into_iter()
			.filter(|backend| match &self.rate_limiter {
				Some(limiter) => limiter.can_acquire(backend.name(), 1),
				None => true,
			})
			.collect()
	}

	// --- health passthroughs -------------------------------------------

	/// Record a successful request against a backend's health
	pub fn record_success(&self, name: &str, latency_ms: u64) {
		if let Some(health) = &self.health {
			health.record_success(name, latency_ms);
		}
	}

	/// Record a failed request against a backend's health
	pub fn record_failure(&self, name: &str, reason: &str, latency_ms: u64) {
		if let Some(health) = &self.health {
			health.record_failure(name, reason, latency_ms);
		}
	}

	/// Whether a backend's circuit is not open (true when tracking is off)
	pub fn is_healthy(&self, name: &str) -> bool {
		self.health
			.as_ref()
			.map(|health| health.is_healthy(name))
			.unwrap_or(true)
	}

	/// Health gate for dispatching (true when tracking is off)
	pub fn should_attempt(&self, name: &str) -> bool {
		self.health
			.as_ref()
			.map(|health| health.should_attempt(name))
			.unwrap_or(true)
	}

	/// Manually open a backend's circuit
	pub fn open_circuit(&self, name: &str, reason: Option<&str>) {
		if let Some(health) = &self.health {
			health.force_open(name, reason);
		}
	}

	/// Manually close a backend's circuit
	pub fn close_circuit(&self, name: &str) {
		if let Some(health) = &self.health {
			health.force_close(name);
		}
	}

	/// Reset a backend's health state and metrics
	pub fn reset_health(&self, name: &str) {
		if let Some(health) = &self.health {
			health.reset(name);
		}
	}

	/// Full health snapshot for one backend
	pub fn backend_health(&self, name: &str) -> Option<BackendHealthState> {
		self.health.as_ref().and_then(|health| health.health(name))
	}

	/// Request metrics for one backend
	pub fn backend_metrics(&self, name: &str) -> Option<BackendMetrics> {
		self.health.as_ref().and_then(|health| health.metrics(name))
	}

	/// Health summaries for all tracked backends
	pub fn health_summary(&self) -> Vec<HealthSummary> {
		self.health
			.as_ref()
			.map(|health| health.summary())
			.unwrap_or_default()
	}

	// --- rate limiter passthroughs -------------------------------------

	/// Non-blocking token acquisition (granted when limiting is off)
	pub fn try_acquire(&self, name: &str, tokens: u32) -> bool {
		self.rate_limiter
			.as_ref()
			.map(|limiter| limiter.try_acquire(name, tokens))
			.unwrap_or(true)
	}

	/// Non-consuming availability check (true when limiting is off)
	pub fn can_acquire(&self, name: &str, tokens: u32) -> bool {
		self.rate_limiter
			.as_ref()
			.map(|limiter| limiter.can_acquire(name, tokens))
			.unwrap_or(true)
	}

	/// Blocking token acquisition (granted when limiting is off)
	pub async fn acquire(&self, name: &str, options: AcquireOptions) -> RateLimitResult<()> {
		match &self.rate_limiter {
			Some(limiter) => limiter.acquire(name, options).await,
			None => Ok(()),
		}
	}

	/// Bucket statistics for one backend
	pub fn rate_stats(&self, name: &str) -> Option<RateLimitStats> {
		self.rate_limiter.as_ref().map(|limiter| limiter.stats(name))
	}

	/// Refill a backend's bucket and zero its counters
	pub fn reset_rate_limit(&self, name: &str) {
		if let Some(limiter) = &self.rate_limiter {
			limiter.reset(name);
		}
	}

	/// Override one backend's bucket configuration
	pub fn set_rate_config(&self, name: &str, config: RateLimiterSettings) {
		if let Some(limiter) = &self.rate_limiter {
			limiter.set_backend_config(name, config);
		}
	}

	/// Stop the rate limiter's background pump, if one is attached
	pub fn shutdown(&self) {
		if let Some(limiter) = &self.rate_limiter {
			limiter.dispose();
		}
		debug!("Backend registry shut down");
	}
}

impl Default for BackendRegistry {
	fn default() -> Self {
		Self::new()
	}
}
