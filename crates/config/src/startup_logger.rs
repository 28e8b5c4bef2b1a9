//! Service startup logging for the SIP dispatch layer
//!
//! Subscriber installation plus a startup banner, intended to be called
//! once at the application's top level.

use std::env;
use tracing::info;

use crate::settings::{LogFormat, LoggingSettings};

/// Install a global tracing subscriber according to the logging settings
///
/// `RUST_LOG` takes precedence over the configured level. Returns quietly
/// if a subscriber is already installed, so tests can call this freely.
pub fn init_tracing(settings: &LoggingSettings) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	let result = match settings.format {
		LogFormat::Json => builder.json().try_init(),
		LogFormat::Pretty => builder.pretty().try_init(),
		LogFormat::Compact => builder.compact().try_init(),
	};

	if result.is_err() {
		tracing::debug!("tracing subscriber already installed, keeping existing one");
	}
}

/// Logs service information at startup
pub fn log_service_info() {
	info!("=== SIP Dispatch Starting ===");
	info!("🚀 Service: sip-dispatch v{}", env!("CARGO_PKG_VERSION"));
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!(
		"🕒 Started at: {}",
		sip_types::chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("🛑 SIP Dispatch Shutting Down");
}
