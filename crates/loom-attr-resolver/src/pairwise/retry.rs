// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry logic with exponential backoff for pairwise store operations.

use std::time::Duration;

use loom_attr_config::PairwiseSettings;
use tracing::warn;

use crate::error::{StoreError, StoreErrorKind};

#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
	pub retryable_kinds: Vec<StoreErrorKind>,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self::from(&PairwiseSettings::default())
	}
}

impl From<&PairwiseSettings> for RetryConfig {
	fn from(settings: &PairwiseSettings) -> Self {
		Self {
			max_attempts: settings.max_attempts.max(1),
			base_delay: settings.base_delay,
			max_delay: settings.max_delay,
			backoff_factor: 2.0,
			jitter: true,
			retryable_kinds: vec![StoreErrorKind::Connectivity, StoreErrorKind::LockTimeout],
		}
	}
}

impl RetryConfig {
	pub fn is_retryable<E: RetryableError>(&self, err: &E) -> bool {
		err.is_retryable(self)
	}
}

pub trait RetryableError {
	fn is_retryable(&self, cfg: &RetryConfig) -> bool;
}

impl RetryableError for StoreError {
	fn is_retryable(&self, cfg: &RetryConfig) -> bool {
		cfg.retryable_kinds.contains(&self.kind)
	}
}

fn calculate_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
	let exponential_delay = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped_delay = exponential_delay.min(cfg.max_delay.as_secs_f64());

	let final_delay = if cfg.jitter {
		let jitter_factor = 0.5 + fastrand::f64();
		capped_delay * jitter_factor
	} else {
		capped_delay
	};

	Duration::try_from_secs_f64(final_delay).unwrap_or(cfg.max_delay)
}

pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;

	loop {
		match f().await {
			Ok(result) => return Ok(result),
			Err(err) => {
				attempt += 1;

				if !err.is_retryable(cfg) {
					return Err(err);
				}

				if attempt >= cfg.max_attempts {
					warn!(
						error = ?err,
						attempt = attempt,
						max_attempts = cfg.max_attempts,
						"max retry attempts exhausted"
					);
					return Err(err);
				}

				let delay = calculate_delay(cfg, attempt - 1);
				warn!(
					error = ?err,
					attempt = attempt,
					max_attempts = cfg.max_attempts,
					delay_ms = delay.as_millis() as u64,
					"retrying pairwise store operation"
				);

				tokio::time::sleep(delay).await;
			}
		}
	}
}
