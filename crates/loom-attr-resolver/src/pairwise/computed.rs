// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Computed pairwise identifiers.
//!
//! The identifier is a digest over the salt, relying party and principal,
//! each prefixed with its length as a big-endian `u32` so that no two
//! distinct inputs share a preimage.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use loom_attr_config::{DigestAlgorithm, IdEncoding, PairwiseSettings, Salt};
use sha2::{Digest, Sha256, Sha512};

use super::PairwiseIdStore;
use crate::error::StoreError;

/// Derives identifiers from a secret salt.
#[derive(Debug, Clone)]
pub struct ComputedIdGenerator {
	salt: Salt,
	algorithm: DigestAlgorithm,
	encoding: IdEncoding,
}

impl ComputedIdGenerator {
	pub fn new(salt: Salt) -> Self {
		Self {
			salt,
			algorithm: DigestAlgorithm::default(),
			encoding: IdEncoding::default(),
		}
	}

	/// Builds a generator from settings; the salt must be configured.
	pub fn from_settings(settings: &PairwiseSettings) -> Result<Self, StoreError> {
		let salt = settings
			.salt
			.clone()
			.filter(|s| !s.is_empty())
			.ok_or_else(|| StoreError::fatal("pairwise salt is not configured"))?;
		Ok(Self::new(salt)
			.with_algorithm(settings.algorithm)
			.with_encoding(settings.encoding))
	}

	pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
		self.algorithm = algorithm;
		self
	}

	pub fn with_encoding(mut self, encoding: IdEncoding) -> Self {
		self.encoding = encoding;
		self
	}

	pub fn generate(&self, relying_party: &str, principal: &str) -> String {
		let fields = [self.salt.as_bytes(), relying_party.as_bytes(), principal.as_bytes()];
		let digest = match self.algorithm {
			DigestAlgorithm::Sha256 => digest_fields::<Sha256>(&fields),
			DigestAlgorithm::Sha512 => digest_fields::<Sha512>(&fields),
		};
		match self.encoding {
			IdEncoding::Base64 => STANDARD.encode(&digest),
			IdEncoding::Hex => hex::encode(&digest),
		}
	}
}

fn digest_fields<D: Digest>(fields: &[&[u8]]) -> Vec<u8> {
	let mut hasher = D::new();
	for field in fields {
		hasher.update((field.len() as u32).to_be_bytes());
		hasher.update(field);
	}
	hasher.finalize().to_vec()
}

/// Pairwise store that never persists anything.
#[derive(Debug, Clone)]
pub struct ComputedPairwiseIdStore {
	generator: ComputedIdGenerator,
}

impl ComputedPairwiseIdStore {
	pub fn new(generator: ComputedIdGenerator) -> Self {
		Self { generator }
	}
}

#[async_trait]
impl PairwiseIdStore for ComputedPairwiseIdStore {
	async fn get_or_create(&self, relying_party: &str, principal: &str) -> Result<String, StoreError> {
		Ok(self.generator.generate(relying_party, principal))
	}
}
