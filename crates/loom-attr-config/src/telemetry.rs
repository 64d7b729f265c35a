// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup for services embedding the attribute engine.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::ConfigError;
use crate::sections::LoggingSettings;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), ConfigError> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.level))
		.map_err(|e| ConfigError::InvalidValue {
			key: "logging.level".to_string(),
			message: e.to_string(),
		})?;

	let json = settings.json.then(|| tracing_subscriber::fmt::layer().json());
	let plain = (!settings.json).then(tracing_subscriber::fmt::layer);

	tracing_subscriber::registry()
		.with(filter)
		.with(json)
		.with(plain)
		.try_init()
		.map_err(|e| ConfigError::Tracing(e.to_string()))
}
