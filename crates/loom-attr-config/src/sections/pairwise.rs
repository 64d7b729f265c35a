// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pairwise identifier configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use zeroize::Zeroizing;

const DEFAULT_DATABASE_URL: &str = "sqlite:./pairwise.db";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 50;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

/// Minimum accepted salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Digest used by the computed pairwise tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
	#[default]
	Sha256,
	Sha512,
}

impl std::str::FromStr for DigestAlgorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"sha256" | "sha-256" => Ok(Self::Sha256),
			"sha512" | "sha-512" => Ok(Self::Sha512),
			other => Err(format!("unknown digest algorithm '{other}'")),
		}
	}
}

/// Text encoding of computed identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdEncoding {
	#[default]
	Base64,
	Hex,
}

impl std::str::FromStr for IdEncoding {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"base64" => Ok(Self::Base64),
			"hex" => Ok(Self::Hex),
			other => Err(format!("unknown identifier encoding '{other}'")),
		}
	}
}

/// Secret salt for pairwise identifiers. Zeroed on drop, never printed.
#[derive(Clone)]
pub struct Salt(Zeroizing<Vec<u8>>);

impl Salt {
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(Zeroizing::new(bytes.into()))
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for Salt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Salt([REDACTED; {} bytes])", self.0.len())
	}
}

/// Pairwise identifier configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct PairwiseSettings {
	pub database_url: String,
	pub algorithm: DigestAlgorithm,
	pub encoding: IdEncoding,
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	/// Serve the computed identifier when the store stays unavailable.
	pub fallback_to_computed: bool,
	pub salt: Option<Salt>,
}

impl Default for PairwiseSettings {
	fn default() -> Self {
		PairwiseSettingsLayer::default().finalize(None)
	}
}

/// Pairwise identifier configuration layer (partial, for merging).
///
/// The salt is not part of the layer; it only comes from the secret
/// environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PairwiseSettingsLayer {
	#[serde(default)]
	pub database_url: Option<String>,
	#[serde(default)]
	pub algorithm: Option<DigestAlgorithm>,
	#[serde(default)]
	pub encoding: Option<IdEncoding>,
	#[serde(default)]
	pub max_attempts: Option<u32>,
	#[serde(default)]
	pub base_delay_ms: Option<u64>,
	#[serde(default)]
	pub max_delay_ms: Option<u64>,
	#[serde(default)]
	pub fallback_to_computed: Option<bool>,
}

impl PairwiseSettingsLayer {
	pub fn merge(&mut self, other: PairwiseSettingsLayer) {
		if other.database_url.is_some() {
			self.database_url = other.database_url;
		}
		if other.algorithm.is_some() {
			self.algorithm = other.algorithm;
		}
		if other.encoding.is_some() {
			self.encoding = other.encoding;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
		if other.base_delay_ms.is_some() {
			self.base_delay_ms = other.base_delay_ms;
		}
		if other.max_delay_ms.is_some() {
			self.max_delay_ms = other.max_delay_ms;
		}
		if other.fallback_to_computed.is_some() {
			self.fallback_to_computed = other.fallback_to_computed;
		}
	}

	pub fn finalize(self, salt: Option<Salt>) -> PairwiseSettings {
		PairwiseSettings {
			database_url: self
				.database_url
				.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
			algorithm: self.algorithm.unwrap_or_default(),
			encoding: self.encoding.unwrap_or_default(),
			max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
			base_delay: Duration::from_millis(self.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
			max_delay: Duration::from_millis(self.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS)),
			fallback_to_computed: self.fallback_to_computed.unwrap_or(false),
			salt,
		}
	}
}
