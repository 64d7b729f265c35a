// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pairwise (per relying party) persistent identifiers.
//!
//! Two tiers are provided: a computed tier that derives the identifier from
//! a salted digest and needs no storage, and a stored tier that persists the
//! first identifier issued so it survives salt rotation and can be retired.

mod computed;
mod connector;
mod memory;
mod retry;
mod sqlite;
mod store;

pub use computed::{ComputedIdGenerator, ComputedPairwiseIdStore};
pub use connector::PairwiseIdConnector;
pub use memory::InMemoryPairwiseIdBackend;
pub use retry::{retry, RetryConfig, RetryableError};
pub use sqlite::{create_pool, SqlitePairwiseIdBackend};
pub use store::{InitialIdSource, PairwiseIdBackend, PairwiseKey, StoredPairwiseIdStore};

use async_trait::async_trait;

use crate::error::StoreError;

/// Issues the identifier for a (relying party, principal) pair.
///
/// Repeated calls for the same pair return the same value.
#[async_trait]
pub trait PairwiseIdStore: Send + Sync {
	async fn get_or_create(&self, relying_party: &str, principal: &str) -> Result<String, StoreError>;
}
