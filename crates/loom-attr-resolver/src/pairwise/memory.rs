// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::store::{PairwiseIdBackend, PairwiseKey};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
	active: HashMap<PairwiseKey, String>,
	/// Every identifier ever issued, including deactivated ones.
	issued: HashSet<String>,
}

/// Process-local pairwise backend with the same uniqueness rules as the
/// SQLite backend.
#[derive(Debug, Default)]
pub struct InMemoryPairwiseIdBackend {
	state: Mutex<State>,
}

impl InMemoryPairwiseIdBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn active_count(&self) -> usize {
		self.state.lock().await.active.len()
	}
}

#[async_trait]
impl PairwiseIdBackend for InMemoryPairwiseIdBackend {
	async fn find(&self, key: &PairwiseKey) -> Result<Option<String>, StoreError> {
		Ok(self.state.lock().await.active.get(key).cloned())
	}

	async fn insert(&self, key: &PairwiseKey, persistent_id: &str) -> Result<(), StoreError> {
		let mut state = self.state.lock().await;
		if state.active.contains_key(key) {
			return Err(StoreError::duplicate("pair already has an active identifier"));
		}
		if state.issued.contains(persistent_id) {
			return Err(StoreError::duplicate("identifier already issued"));
		}
		state.issued.insert(persistent_id.to_string());
		state.active.insert(key.clone(), persistent_id.to_string());
		Ok(())
	}

	async fn deactivate(&self, key: &PairwiseKey) -> Result<bool, StoreError> {
		Ok(self.state.lock().await.active.remove(key).is_some())
	}
}
