//! Configuration loading utilities

use crate::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Read(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load settings from `config/config.*` plus `SIP_*` environment overrides
///
/// The file is optional; with nothing present the documented defaults
/// apply.
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load_config_from("config/config")
}

/// Load settings from a specific file path (extension optional)
pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let raw = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix("SIP")
				.separator("__")
				.try_parsing(true),
		)
		.build()?;

	let settings: Settings = raw.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}
