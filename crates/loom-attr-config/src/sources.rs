// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: TOML files and `LOOM_ATTR_*` environment variables.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::EngineConfigLayer;
use crate::sections::{
	LoggingSettingsLayer, PairwiseSettingsLayer, ResolverSettingsLayer, Salt,
};

/// Environment variable holding the pairwise identifier salt.
pub const SALT_ENV: &str = "LOOM_ATTR_PAIRWISE_SALT";

/// Path of the optional system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/loom/attr.toml";

/// Where a configuration layer comes from.
///
/// Sources are applied in the order given; later sources override earlier
/// ones field by field. Built-in defaults are not a source: they are filled
/// in by `finalize` for anything no source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
	/// A TOML file. A missing file is skipped unless `required` is set.
	File { path: PathBuf, required: bool },
	/// `LOOM_ATTR_*` environment variables.
	Environment,
}

impl ConfigSource {
	/// A file that must exist.
	pub fn file(path: impl Into<PathBuf>) -> Self {
		ConfigSource::File {
			path: path.into(),
			required: true,
		}
	}

	/// The system-wide file, skipped when absent.
	pub fn system_file() -> Self {
		ConfigSource::File {
			path: PathBuf::from(SYSTEM_CONFIG_PATH),
			required: false,
		}
	}

	pub fn load(&self) -> Result<EngineConfigLayer, ConfigError> {
		match self {
			ConfigSource::File { path, required } => load_file(path, *required),
			ConfigSource::Environment => {
				debug!("loading environment variables");
				EnvSource.load_with(&process_env)
			}
		}
	}
}

fn load_file(path: &Path, required: bool) -> Result<EngineConfigLayer, ConfigError> {
	let content = match std::fs::read_to_string(path) {
		Ok(content) => content,
		Err(e) if e.kind() == ErrorKind::NotFound && !required => {
			debug!(path = %path.display(), "optional config file not found, skipping");
			return Ok(EngineConfigLayer::default());
		}
		Err(e) => {
			return Err(ConfigError::FileRead {
				path: path.to_path_buf(),
				source: e,
			})
		}
	};

	let layer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source: e,
	})?;
	trace!(path = %path.display(), "parsed config file");
	Ok(layer)
}

/// Environment variable source.
///
/// Convention: LOOM_ATTR_<SECTION>_<FIELD>
pub struct EnvSource;

impl EnvSource {
	/// Loads a layer using `lookup` in place of the process environment.
	pub fn load_with(
		&self,
		lookup: &dyn Fn(&str) -> Option<String>,
	) -> Result<EngineConfigLayer, ConfigError> {
		let vars = Vars { lookup };
		Ok(EngineConfigLayer {
			resolver: Some(ResolverSettingsLayer {
				max_concurrent_fetches: vars
					.parse::<usize>("LOOM_ATTR_RESOLVER_MAX_CONCURRENT_FETCHES")?,
				fetch_timeout_ms: vars.parse::<u64>("LOOM_ATTR_RESOLVER_FETCH_TIMEOUT_MS")?,
			}),
			pairwise: Some(PairwiseSettingsLayer {
				database_url: vars.get("LOOM_ATTR_PAIRWISE_DATABASE_URL"),
				algorithm: vars.parse("LOOM_ATTR_PAIRWISE_ALGORITHM")?,
				encoding: vars.parse("LOOM_ATTR_PAIRWISE_ENCODING")?,
				max_attempts: vars.parse::<u32>("LOOM_ATTR_PAIRWISE_MAX_ATTEMPTS")?,
				base_delay_ms: vars.parse::<u64>("LOOM_ATTR_PAIRWISE_BASE_DELAY_MS")?,
				max_delay_ms: vars.parse::<u64>("LOOM_ATTR_PAIRWISE_MAX_DELAY_MS")?,
				fallback_to_computed: vars.bool("LOOM_ATTR_PAIRWISE_FALLBACK_TO_COMPUTED"),
			}),
			logging: Some(LoggingSettingsLayer {
				level: vars.get("LOOM_ATTR_LOG_LEVEL"),
				json: vars.bool("LOOM_ATTR_LOG_JSON"),
			}),
		})
	}

	/// Reads the pairwise salt secret.
	pub fn salt_with(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Option<Salt> {
		Vars { lookup }.get(SALT_ENV).map(|s| Salt::new(s.into_bytes()))
	}

	pub fn salt(&self) -> Option<Salt> {
		self.salt_with(&process_env)
	}
}

fn process_env(name: &str) -> Option<String> {
	std::env::var(name).ok()
}

struct Vars<'a> {
	lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
	fn get(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.get(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: std::str::FromStr,
		T::Err: std::fmt::Display,
	{
		match self.get(name) {
			Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid value '{v}': {e}"),
			}),
			None => Ok(None),
		}
	}
}
