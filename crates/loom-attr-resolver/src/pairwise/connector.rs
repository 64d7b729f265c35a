// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use loom_attr_core::{Attribute, AttributeMap, AttributeValue};

use super::PairwiseIdStore;
use crate::error::ConnectorError;
use crate::node::{ConnectorInput, DataConnector};

/// Data connector that yields a pairwise identifier for the requester.
///
/// The relying party is the request's requester, or the affinity group the
/// requester belongs to. The principal is the request principal unless a
/// source attribute is configured, in which case that attribute must carry
/// exactly one value.
pub struct PairwiseIdConnector {
	attribute_id: String,
	store: Arc<dyn PairwiseIdStore>,
	source_attribute_id: Option<String>,
	affinity_groups: HashMap<String, String>,
}

impl PairwiseIdConnector {
	pub fn new(attribute_id: impl Into<String>, store: Arc<dyn PairwiseIdStore>) -> Self {
		Self {
			attribute_id: attribute_id.into(),
			store,
			source_attribute_id: None,
			affinity_groups: HashMap::new(),
		}
	}

	pub fn with_source_attribute(mut self, attribute_id: impl Into<String>) -> Self {
		self.source_attribute_id = Some(attribute_id.into());
		self
	}

	/// Issues `requester` the same identifiers as every other member of `group`.
	pub fn with_affinity_group(mut self, requester: impl Into<String>, group: impl Into<String>) -> Self {
		self.affinity_groups.insert(requester.into(), group.into());
		self
	}

	fn principal(&self, input: &ConnectorInput<'_>) -> Result<String, ConnectorError> {
		let principal = match &self.source_attribute_id {
			None => input.request.principal.clone(),
			Some(source) => {
				let values = input
					.attributes
					.get(source)
					.map(Attribute::values)
					.unwrap_or_default();
				match values {
					[single] => single.display_value(),
					[] => return Err(ConnectorError::MissingInput(format!("source attribute '{source}'"))),
					_ => {
						return Err(ConnectorError::InvalidInput(format!(
							"source attribute '{source}' has {} values",
							values.len()
						)))
					}
				}
			}
		};

		if principal.is_empty() {
			return Err(ConnectorError::MissingInput("principal".to_string()));
		}
		Ok(principal)
	}
}

#[async_trait]
impl DataConnector for PairwiseIdConnector {
	async fn fetch(&self, input: &ConnectorInput<'_>) -> Result<AttributeMap, ConnectorError> {
		let requester = input
			.request
			.requester
			.as_deref()
			.filter(|r| !r.is_empty())
			.ok_or_else(|| ConnectorError::MissingInput("requester".to_string()))?;
		let relying_party = self
			.affinity_groups
			.get(requester)
			.map(String::as_str)
			.unwrap_or(requester);
		let principal = self.principal(input)?;

		let id = self.store.get_or_create(relying_party, &principal).await?;

		let mut out = AttributeMap::new();
		out.insert(
			self.attribute_id.clone(),
			Attribute::with_values(self.attribute_id.clone(), [AttributeValue::string(id)]),
		);
		Ok(out)
	}
}
