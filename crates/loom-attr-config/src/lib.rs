// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Loom attribute engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe settings for the resolver, the pairwise identifier store and logging
//! - Consistent environment variable naming (`LOOM_ATTR_*`)
//! - Tracing subscriber initialisation
//!
//! The node graph and filter policies are not configured here; they are
//! built in memory by the embedding service and handed to the engine.
//!
//! # Usage
//!
//! ```ignore
//! use loom_attr_config::{init_tracing, load_config};
//!
//! let config = load_config()?;
//! init_tracing(&config.logging)?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;
pub mod telemetry;

pub use error::ConfigError;
pub use layer::EngineConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, EnvSource, SALT_ENV, SYSTEM_CONFIG_PATH};
pub use telemetry::init_tracing;

use tracing::{debug, info};

/// Fully resolved engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
	pub resolver: ResolverSettings,
	pub pairwise: PairwiseSettings,
	pub logging: LoggingSettings,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_ATTR_*`)
/// 2. Config file (`/etc/loom/attr.toml`, if present)
/// 3. Built-in defaults
pub fn load_config() -> Result<EngineConfig, ConfigError> {
	load_from_sources(&[ConfigSource::system_file(), ConfigSource::Environment])
}

/// Load configuration with a custom config file path, which must exist.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<EngineConfig, ConfigError> {
	load_from_sources(&[ConfigSource::file(config_path), ConfigSource::Environment])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<EngineConfig, ConfigError> {
	load_from_sources(&[ConfigSource::Environment])
}

/// Merges `sources` in order, later sources winning, then finalizes.
pub fn load_from_sources(sources: &[ConfigSource]) -> Result<EngineConfig, ConfigError> {
	let mut merged = EngineConfigLayer::default();
	for source in sources {
		debug!(source = ?source, "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged, EnvSource.salt())
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: EngineConfigLayer, salt: Option<Salt>) -> Result<EngineConfig, ConfigError> {
	let resolver = layer.resolver.unwrap_or_default().finalize();
	let pairwise = layer.pairwise.unwrap_or_default().finalize(salt);
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&resolver, &pairwise)?;

	info!(
		max_concurrent_fetches = resolver.max_concurrent_fetches,
		fetch_timeout_ms = resolver.fetch_timeout.as_millis() as u64,
		pairwise_algorithm = ?pairwise.algorithm,
		pairwise_salt_configured = pairwise.salt.is_some(),
		pairwise_max_attempts = pairwise.max_attempts,
		"Attribute engine configuration loaded"
	);

	Ok(EngineConfig {
		resolver,
		pairwise,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	resolver: &ResolverSettings,
	pairwise: &PairwiseSettings,
) -> Result<(), ConfigError> {
	if resolver.max_concurrent_fetches == 0 {
		return Err(ConfigError::Validation(
			"resolver.max_concurrent_fetches must be at least 1".to_string(),
		));
	}

	if pairwise.max_attempts == 0 {
		return Err(ConfigError::Validation(
			"pairwise.max_attempts must be at least 1".to_string(),
		));
	}

	if pairwise.base_delay > pairwise.max_delay {
		return Err(ConfigError::Validation(
			"pairwise.base_delay_ms must not exceed pairwise.max_delay_ms".to_string(),
		));
	}

	if let Some(salt) = &pairwise.salt {
		if salt.len() < MIN_SALT_LEN {
			return Err(ConfigError::Validation(format!(
				"{SALT_ENV} must be at least {MIN_SALT_LEN} bytes"
			)));
		}
	}

	Ok(())
}
