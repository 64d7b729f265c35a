// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stored pairwise identifiers.
//!
//! The stored tier persists the first identifier issued for a
//! (relying party, principal) pair and returns it on every later request.
//! Issuance is find-then-insert; a uniqueness violation on insert means a
//! concurrent issuer won the race, so the stored row is re-read and adopted.
//! Every caller therefore converges on the same identifier.

use std::sync::Arc;

use async_trait::async_trait;
use loom_attr_config::PairwiseSettings;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::computed::ComputedIdGenerator;
use super::retry::{retry, RetryConfig};
use super::PairwiseIdStore;
use crate::error::StoreError;

/// Insert attempts made when a fresh identifier collides with one already
/// issued to a different pair.
const MAX_COLLISION_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairwiseKey {
	pub relying_party: String,
	pub principal: String,
}

impl PairwiseKey {
	pub fn new(relying_party: impl Into<String>, principal: impl Into<String>) -> Self {
		Self {
			relying_party: relying_party.into(),
			principal: principal.into(),
		}
	}
}

/// Persistence for stored pairwise identifiers.
///
/// Implementations must reject a second active row for the same key and
/// any reuse of an identifier with [`crate::StoreErrorKind::Duplicate`].
#[async_trait]
pub trait PairwiseIdBackend: Send + Sync {
	/// Returns the active identifier for `key`.
	async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError>;

	async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError>;

	/// Retires the active identifier for `key`. Returns whether one existed.
	async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError>;
}

#[async_trait]
impl<B: PairwiseIdBackend + ?Sized> PairwiseIdBackend for Arc<B> {
	async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError> {
		(**self).find(key).await
	}

	async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError> {
		(**self).insert(key, persistent_id).await
	}

	async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError> {
		(**self).deactivate(key).await
	}
}

/// Where a newly issued identifier comes from.
#[derive(Debug, Clone)]
pub enum InitialIdSource {
	Computed(ComputedIdGenerator),
	/// A random UUID.
	Random,
}

impl InitialIdSource {
	fn generate(&self, key: &PairwiseKey) -> String {
		match self {
			InitialIdSource::Computed(generator) => {
				generator.generate(&key.relying_party, &key.principal)
			}
			InitialIdSource::Random => random_id(),
		}
	}
}

fn random_id() -> String {
	Uuid::new_v4().to_string()
}

pub struct StoredPairwiseIdStore<B> {
	backend: B,
	initial: InitialIdSource,
	retry: RetryConfig,
	fallback: Option<ComputedIdGenerator>,
}

impl<B: PairwiseIdBackend> StoredPairwiseIdStore<B> {
	pub fn new(backend: B, initial: InitialIdSource) -> Self {
		Self {
			backend,
			initial,
			retry: RetryConfig::default(),
			fallback: None,
		}
	}

	/// Computed initial values, retry policy and degraded mode from settings.
	pub fn from_settings(backend: B, settings: &PairwiseSettings) -> Result<Self, StoreError> {
		let generator = ComputedIdGenerator::from_settings(settings)?;
		let mut store = Self::new(backend, InitialIdSource::Computed(generator.clone()))
			.with_retry(RetryConfig::from(settings));
		if settings.fallback_to_computed {
			store = store.with_fallback(generator);
		}
		Ok(store)
	}

	pub fn with_retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	/// Serve computed identifiers when the store stays unavailable after
	/// retries. Such identifiers are not persisted.
	pub fn with_fallback(mut self, generator: ComputedIdGenerator) -> Self {
		self.fallback = Some(generator);
		self
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Retires the identifier for a pair; the next request issues a new one.
	#[instrument(skip(self, principal), fields(relying_party = %relying_party))]
	pub async fn deactivate(&self, relying_party: &str, principal: &str) -> Result<bool, StoreError> {
		let key = PairwiseKey::new(relying_party, principal);
		retry(&self.retry, || self.backend.deactivate(&key)).await
	}

	async fn get_or_create_once(&self, key: &PairwiseKey) -> Result<String, StoreError> {
		if let Some(existing) = self.backend.find(key).await? {
			return Ok(existing);
		}

		for attempt in 0..MAX_COLLISION_ATTEMPTS {
			let candidate = if attempt == 0 {
				self.initial.generate(key)
			} else {
				random_id()
			};

			match self.backend.insert(key, &candidate).await {
				Ok(()) => {
					debug!("issued new pairwise identifier");
					return Ok(candidate);
				}
				Err(err) if err.is_duplicate() => {
					if let Some(existing) = self.backend.find(key).await? {
						debug!("concurrent issuance detected, adopting stored identifier");
						return Ok(existing);
					}
					warn!(attempt, "pairwise identifier already issued to another pair, regenerating");
				}
				Err(err) => return Err(err),
			}
		}

		Err(StoreError::fatal(
			"could not allocate an unused pairwise identifier",
		))
	}
}

#[async_trait]
impl<B: PairwiseIdBackend> PairwiseIdStore for StoredPairwiseIdStore<B> {
	#[instrument(skip(self, principal), fields(relying_party = %relying_party))]
	async fn get_or_create(&self, relying_party: &str, principal: &str) -> Result<String, StoreError> {
		let key = PairwiseKey::new(relying_party, principal);
		match retry(&self.retry, || self.get_or_create_once(&key)).await {
			Ok(id) => Ok(id),
			Err(err) if self.retry.is_retryable(&err) => match &self.fallback {
				Some(generator) => {
					warn!(error = %err, "pairwise store unavailable, serving computed identifier");
					Ok(generator.generate(relying_party, principal))
				}
				None => Err(err),
			},
			Err(err) => Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::StoreErrorKind;
	use crate::pairwise::memory::InMemoryPairwiseIdBackend;
	use loom_attr_config::Salt;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::time::Duration;
	use tokio::sync::Barrier;

	const RP: &str = "https://sp.example.org";

	fn generator() -> ComputedIdGenerator {
		ComputedIdGenerator::new(Salt::new(b"0123456789abcdef".to_vec()))
	}

	fn fast_retry() -> RetryConfig {
		RetryConfig {
			max_attempts: 3,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(2),
			jitter: false,
			..RetryConfig::default()
		}
	}

	/// Holds the first two lookups until both callers have missed, forcing a
	/// concurrent insert.
	struct RacingBackend {
		inner: InMemoryPairwiseIdBackend,
		barrier: Barrier,
		finds: AtomicU32,
	}

	#[async_trait]
	impl PairwiseIdBackend for RacingBackend {
		async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError> {
			let found = self.inner.find(key).await?;
			if self.finds.fetch_add(1, Ordering::SeqCst) < 2 {
				self.barrier.wait().await;
			}
			Ok(found)
		}

		async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError> {
			self.inner.insert(key, persistent_id).await
		}

		async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError> {
			self.inner.deactivate(key).await
		}
	}

	/// Fails a fixed number of calls before delegating.
	struct FlakyBackend {
		inner: InMemoryPairwiseIdBackend,
		failures: AtomicU32,
		kind: StoreErrorKind,
	}

	impl FlakyBackend {
		fn new(failures: u32, kind: StoreErrorKind) -> Self {
			Self {
				inner: InMemoryPairwiseIdBackend::new(),
				failures: AtomicU32::new(failures),
				kind,
			}
		}

		fn trip(&self) -> Result<(), StoreError> {
			let remaining = self.failures.load(Ordering::SeqCst);
			if remaining > 0 {
				self.failures.store(remaining - 1, Ordering::SeqCst);
				return Err(StoreError::new(self.kind, "injected"));
			}
			Ok(())
		}
	}

	#[async_trait]
	impl PairwiseIdBackend for FlakyBackend {
		async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError> {
			self.trip()?;
			self.inner.find(key).await
		}

		async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError> {
			self.trip()?;
			self.inner.insert(key, persistent_id).await
		}

		async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError> {
			self.trip()?;
			self.inner.deactivate(key).await
		}
	}

	#[tokio::test]
	async fn first_issue_is_persisted_and_reused() {
		let store = StoredPairwiseIdStore::new(
			InMemoryPairwiseIdBackend::new(),
			InitialIdSource::Computed(generator()),
		);
		let first = store.get_or_create(RP, "alice").await.unwrap();
		assert_eq!(first, generator().generate(RP, "alice"));
		assert_eq!(store.get_or_create(RP, "alice").await.unwrap(), first);
		assert_eq!(store.backend().active_count().await, 1);
	}

	#[tokio::test]
	async fn random_source_is_stable_once_stored() {
		let store = StoredPairwiseIdStore::new(InMemoryPairwiseIdBackend::new(), InitialIdSource::Random);
		let first = store.get_or_create(RP, "alice").await.unwrap();
		let second = store.get_or_create(RP, "alice").await.unwrap();
		assert_eq!(first, second);
		assert_ne!(first, store.get_or_create(RP, "bob").await.unwrap());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn concurrent_issuers_converge() {
		let store = Arc::new(StoredPairwiseIdStore::new(
			RacingBackend {
				inner: InMemoryPairwiseIdBackend::new(),
				barrier: Barrier::new(2),
				finds: AtomicU32::new(0),
			},
			InitialIdSource::Random,
		));

		let a = tokio::spawn({
			let store = store.clone();
			async move { store.get_or_create(RP, "alice").await }
		});
		let b = tokio::spawn({
			let store = store.clone();
			async move { store.get_or_create(RP, "alice").await }
		});

		let a = a.await.unwrap().unwrap();
		let b = b.await.unwrap().unwrap();
		assert_eq!(a, b);
		assert_eq!(store.backend().inner.active_count().await, 1);
	}

	#[tokio::test]
	async fn identifier_collision_regenerates() {
		let backend = Arc::new(InMemoryPairwiseIdBackend::new());
		let taken = generator().generate(RP, "alice");
		backend
			.insert(&PairwiseKey::new(RP, "mallory"), &taken)
			.await
			.unwrap();

		let store = StoredPairwiseIdStore::new(backend.clone(), InitialIdSource::Computed(generator()));
		let id = store.get_or_create(RP, "alice").await.unwrap();
		assert_ne!(id, taken);
		assert_eq!(backend.find(&PairwiseKey::new(RP, "alice")).await.unwrap(), Some(id));
	}

	#[tokio::test]
	async fn deactivation_issues_new_identifier() {
		let store = StoredPairwiseIdStore::new(
			InMemoryPairwiseIdBackend::new(),
			InitialIdSource::Computed(generator()),
		);
		let first = store.get_or_create(RP, "alice").await.unwrap();
		assert!(store.deactivate(RP, "alice").await.unwrap());
		assert!(!store.deactivate(RP, "alice").await.unwrap());

		let second = store.get_or_create(RP, "alice").await.unwrap();
		assert_ne!(first, second);
	}

	#[tokio::test]
	async fn transient_failures_are_retried() {
		let store = StoredPairwiseIdStore::new(
			FlakyBackend::new(2, StoreErrorKind::LockTimeout),
			InitialIdSource::Computed(generator()),
		)
		.with_retry(fast_retry());
		let id = store.get_or_create(RP, "alice").await.unwrap();
		assert_eq!(id, generator().generate(RP, "alice"));
	}

	#[tokio::test]
	async fn exhausted_retries_fail_without_fallback() {
		let store = StoredPairwiseIdStore::new(
			FlakyBackend::new(10, StoreErrorKind::Connectivity),
			InitialIdSource::Computed(generator()),
		)
		.with_retry(fast_retry());
		let err = store.get_or_create(RP, "alice").await.unwrap_err();
		assert_eq!(err.kind, StoreErrorKind::Connectivity);
	}

	#[tokio::test]
	async fn exhausted_retries_fall_back_to_computed() {
		let store = StoredPairwiseIdStore::new(
			FlakyBackend::new(10, StoreErrorKind::Connectivity),
			InitialIdSource::Random,
		)
		.with_retry(fast_retry())
		.with_fallback(generator());
		let id = store.get_or_create(RP, "alice").await.unwrap();
		assert_eq!(id, generator().generate(RP, "alice"));
	}

	#[tokio::test]
	async fn fatal_errors_do_not_fall_back() {
		let store = StoredPairwiseIdStore::new(
			FlakyBackend::new(1, StoreErrorKind::Fatal),
			InitialIdSource::Random,
		)
		.with_retry(fast_retry())
		.with_fallback(generator());
		let err = store.get_or_create(RP, "alice").await.unwrap_err();
		assert_eq!(err.kind, StoreErrorKind::Fatal);
	}

	#[tokio::test]
	async fn from_settings_requires_salt() {
		let result = StoredPairwiseIdStore::from_settings(
			InMemoryPairwiseIdBackend::new(),
			&PairwiseSettings::default(),
		);
		assert!(result.is_err());

		let settings = PairwiseSettings {
			salt: Some(Salt::new(b"0123456789abcdef".to_vec())),
			fallback_to_computed: true,
			..PairwiseSettings::default()
		};
		let store = StoredPairwiseIdStore::from_settings(InMemoryPairwiseIdBackend::new(), &settings).unwrap();
		assert!(store.fallback.is_some());
		assert_eq!(
			store.get_or_create(RP, "alice").await.unwrap(),
			generator().generate(RP, "alice")
		);
	}
}
