//! Configuration settings structures

use serde::{Deserialize, Serialize};
use sip_types::routing::{RoutePriority, RouterConfig};
use thiserror::Error;

/// Main settings for the dispatch layer
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub circuit_breaker: CircuitBreakerSettings,
	pub rate_limiter: RateLimiterSettings,
	pub router: RouterSettings,
	pub logging: LoggingSettings,
}

/// Circuit breaker configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CircuitBreakerSettings {
	/// Consecutive failures that open a backend's circuit
	pub failure_threshold: u32,

	/// How long an open circuit waits before allowing a test request
	pub reset_timeout_ms: u64,

	/// Consecutive successes in half-open that close the circuit
	pub success_threshold: u32,

	/// Collect per-backend request metrics
	pub enable_metrics: bool,
}

impl Default for CircuitBreakerSettings {
	fn default() -> Self {
		Self {
			failure_threshold: 3,
			reset_timeout_ms: 30_000,
			success_threshold: 2,
			enable_metrics: true,
		}
	}
}

/// What `acquire` does when tokens are not immediately available
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AcquirePolicy {
	/// Fail immediately with a rate-limit-exceeded error
	Reject,
	/// Enqueue the caller until tokens arrive or the timeout elapses
	Queue,
}

/// Token bucket rate limiter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimiterSettings {
	/// Bucket capacity
	pub max_tokens: u32,

	/// Tokens added per refill interval
	pub refill_rate: u32,

	/// Refill interval in milliseconds
	pub refill_interval_ms: u64,

	/// Behavior when tokens are exhausted
	pub acquire_policy: AcquirePolicy,

	/// Maximum number of queued waiters per backend (queue policy only)
	pub max_queue_size: usize,

	/// How often the background pump re-evaluates queued waiters
	pub queue_pump_interval_ms: u64,
}

impl Default for RateLimiterSettings {
	fn default() -> Self {
		Self {
			max_tokens: 10,
			refill_rate: 1,
			refill_interval_ms: 1_000,
			acquire_policy: AcquirePolicy::Reject,
			max_queue_size: 100,
			queue_pump_interval_ms: 100,
		}
	}
}

/// Default routing behavior
///
/// These map onto the per-request [`RouterConfig`]; callers override
/// individual fields per request.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RouterSettings {
	pub prioritize: RoutePriority,
	pub require_viewing_keys: bool,
	pub allow_compute_privacy: bool,
	pub include_unhealthy: bool,
	pub enable_fallback: bool,
	pub max_fallback_attempts: u32,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			prioritize: RoutePriority::Privacy,
			require_viewing_keys: false,
			allow_compute_privacy: true,
			include_unhealthy: false,
			enable_fallback: true,
			max_fallback_attempts: 3,
		}
	}
}

impl From<RouterSettings> for RouterConfig {
	fn from(settings: RouterSettings) -> Self {
		Self {
			prioritize: settings.prioritize,
			require_viewing_keys: settings.require_viewing_keys,
			allow_compute_privacy: settings.allow_compute_privacy,
			include_unhealthy: settings.include_unhealthy,
			enable_fallback: settings.enable_fallback,
			max_fallback_attempts: settings.max_fallback_attempts,
			..RouterConfig::default()
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

/// Validation errors for settings
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
	#[error("{field} must be at least {min}")]
	BelowMinimum { field: &'static str, min: u64 },
}

impl Settings {
	/// Reject configurations that would disable a component outright
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		fn at_least(
			value: u64,
			min: u64,
			field: &'static str,
		) -> Result<(), ConfigValidationError> {
			if value < min {
				Err(ConfigValidationError::BelowMinimum { field, min })
			} else {
				Ok(())
			}
		}

		at_least(
			self.circuit_breaker.failure_threshold as u64,
			1,
			"circuit_breaker.failure_threshold",
		)?;
		at_least(
			self.circuit_breaker.success_threshold as u64,
			1,
			"circuit_breaker.success_threshold",
		)?;
		at_least(self.rate_limiter.max_tokens as u64, 1, "rate_limiter.max_tokens")?;
		at_least(
			self.rate_limiter.refill_interval_ms,
			1,
			"rate_limiter.refill_interval_ms",
		)?;
		at_least(
			self.rate_limiter.max_queue_size as u64,
			1,
			"rate_limiter.max_queue_size",
		)?;
		at_least(
			self.rate_limiter.queue_pump_interval_ms,
			1,
			"rate_limiter.queue_pump_interval_ms",
		)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_carry_documented_values() {
		let settings = Settings::default();

		assert_eq!(settings.circuit_breaker.failure_threshold, 3);
		assert_eq!(settings.circuit_breaker.reset_timeout_ms, 30_000);
		assert_eq!(settings.circuit_breaker.success_threshold, 2);
		assert!(settings.circuit_breaker.enable_metrics);

		assert_eq!(settings.rate_limiter.max_tokens, 10);
		assert_eq!(settings.rate_limiter.refill_rate, 1);
		assert_eq!(settings.rate_limiter.refill_interval_ms, 1_000);
		assert_eq!(settings.rate_limiter.acquire_policy, AcquirePolicy::Reject);

		assert_eq!(settings.router.prioritize, RoutePriority::Privacy);
		assert!(settings.router.enable_fallback);
		assert_eq!(settings.router.max_fallback_attempts, 3);
	}

	#[test]
	fn test_validation_rejects_zero_thresholds() {
		let mut settings = Settings::default();
		settings.circuit_breaker.failure_threshold = 0;

		assert_eq!(
			settings.validate(),
			Err(ConfigValidationError::BelowMinimum {
				field: "circuit_breaker.failure_threshold",
				min: 1,
			})
		);
	}

	#[test]
	fn test_router_settings_convert_to_config() {
		let mut settings = RouterSettings::default();
		settings.prioritize = RoutePriority::Speed;
		settings.max_fallback_attempts = 5;

		let config: RouterConfig = settings.into();
		assert_eq!(config.prioritize, RoutePriority::Speed);
		assert_eq!(config.max_fallback_attempts, 5);
		assert!(config.preferred_backend.is_none());
	}

	#[test]
	fn test_settings_deserialize_partial() {
		let toml = r#"
			[circuit_breaker]
			failure_threshold = 5
		"#;
		let settings: Settings = toml_from_str(toml);

		assert_eq!(settings.circuit_breaker.failure_threshold, 5);
		// Unspecified fields keep their defaults
		assert_eq!(settings.circuit_breaker.success_threshold, 2);
		assert_eq!(settings.rate_limiter.max_tokens, 10);
	}

	fn toml_from_str(raw: &str) -> Settings {
		config::Config::builder()
			.add_source(config::File::from_str(raw, config::FileFormat::Toml))
			.build()
			.unwrap()
			.try_deserialize()
			.unwrap()
	}
}
