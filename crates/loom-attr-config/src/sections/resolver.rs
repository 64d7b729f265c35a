// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolver engine configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Resolver configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
	/// Upper bound on connector fetches in flight across all requests.
	pub max_concurrent_fetches: usize,
	/// Default per-fetch timeout; requests may override it.
	pub fetch_timeout: Duration,
}

impl Default for ResolverSettings {
	fn default() -> Self {
		ResolverSettingsLayer::default().finalize()
	}
}

/// Resolver configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResolverSettingsLayer {
	#[serde(default)]
	pub max_concurrent_fetches: Option<usize>,
	#[serde(default)]
	pub fetch_timeout_ms: Option<u64>,
}

impl ResolverSettingsLayer {
	pub fn merge(&mut self, other: ResolverSettingsLayer) {
		if other.max_concurrent_fetches.is_some() {
			self.max_concurrent_fetches = other.max_concurrent_fetches;
		}
		if other.fetch_timeout_ms.is_some() {
			self.fetch_timeout_ms = other.fetch_timeout_ms;
		}
	}

	pub fn finalize(self) -> ResolverSettings {
		ResolverSettings {
			max_concurrent_fetches: self
				.max_concurrent_fetches
				.unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES),
			fetch_timeout: Duration::from_millis(
				self.fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
			),
		}
	}
}
