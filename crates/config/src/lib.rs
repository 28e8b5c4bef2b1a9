//! SIP Configuration
//!
//! Configuration management and startup utilities for the SIP dispatch layer.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	AcquirePolicy, CircuitBreakerSettings, ConfigValidationError, LogFormat, LoggingSettings,
	RateLimiterSettings, RouterSettings, Settings,
};
pub use startup_logger::{init_tracing, log_service_info, log_service_shutdown};
