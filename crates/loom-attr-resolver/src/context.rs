// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request resolution state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use loom_attr_core::{AttributeMap, RequestContext};
use tokio::sync::OnceCell;

use crate::error::ResolutionError;

/// What a node produced during one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
	Resolved(Arc<AttributeMap>),
	/// The node failed without propagating; dependents see no values.
	Suppressed(ResolutionError),
	Failed(ResolutionError),
}

impl NodeOutcome {
	pub fn is_resolved(&self) -> bool {
		matches!(self, NodeOutcome::Resolved(_))
	}

	pub(crate) fn into_result(self) -> Result<Arc<AttributeMap>, ResolutionError> {
		match self {
			NodeOutcome::Resolved(map) => Ok(map),
			NodeOutcome::Suppressed(_) => Ok(Arc::new(AttributeMap::new())),
			NodeOutcome::Failed(err) => Err(err),
		}
	}
}

/// State owned by a single resolution: the request and the memo of node
/// outcomes.
///
/// Every node is evaluated at most once per context. Concurrent dependents
/// of the same node wait on a shared cell instead of re-running it.
#[derive(Debug)]
pub struct ResolutionContext {
	request: RequestContext,
	requested_attribute_ids: Vec<String>,
	memo: Mutex<HashMap<String, Arc<OnceCell<NodeOutcome>>>>,
}

impl ResolutionContext {
	pub fn new(request: RequestContext, requested_attribute_ids: Vec<String>) -> Self {
		Self {
			request,
			requested_attribute_ids,
			memo: Mutex::new(HashMap::new()),
		}
	}

	pub fn request(&self) -> &RequestContext {
		&self.request
	}

	pub fn requested_attribute_ids(&self) -> &[String] {
		&self.requested_attribute_ids
	}

	/// Outcome recorded for `node_id`, if it was evaluated.
	pub fn outcome(&self, node_id: &str) -> Option<NodeOutcome> {
		let memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
		memo.get(node_id).and_then(|cell| cell.get().cloned())
	}

	/// Ids of every node evaluated so far, sorted.
	pub fn evaluated_node_ids(&self) -> Vec<String> {
		let memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
		let mut ids: Vec<String> = memo
			.iter()
			.filter(|(_, cell)| cell.initialized())
			.map(|(id, _)| id.clone())
			.collect();
		ids.sort();
		ids
	}

	pub(crate) fn cell(&self, node_id: &str) -> Arc<OnceCell<NodeOutcome>> {
		let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
		match memo.get(node_id) {
			Some(cell) => Arc::clone(cell),
			None => {
				let cell = Arc::new(OnceCell::new());
				memo.insert(node_id.to_string(), Arc::clone(&cell));
				cell
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn cell_is_shared_per_node() {
		let ctx = ResolutionContext::new(RequestContext::new("alice"), Vec::new());
		let first = ctx.cell("a");
		let second = ctx.cell("a");
		assert!(Arc::ptr_eq(&first, &second));

		first
			.get_or_init(|| async { NodeOutcome::Resolved(Arc::new(AttributeMap::new())) })
			.await;
		assert!(ctx.outcome("a").unwrap().is_resolved());
		assert_eq!(ctx.evaluated_node_ids(), vec!["a".to_string()]);
	}

	#[test]
	fn unevaluated_nodes_are_not_listed() {
		let ctx = ResolutionContext::new(RequestContext::new("alice"), Vec::new());
		let _ = ctx.cell("pending");
		assert!(ctx.evaluated_node_ids().is_empty());
		assert!(ctx.outcome("pending").is_none());
	}

	#[test]
	fn suppressed_outcome_reads_as_empty() {
		let outcome = NodeOutcome::Suppressed(ResolutionError::UnknownNode("x".into()));
		assert!(outcome.into_result().unwrap().is_empty());
	}
}
