// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in data connectors.

use async_trait::async_trait;
use loom_attr_core::{Attribute, AttributeMap};

use crate::error::ConnectorError;
use crate::node::{ConnectorInput, DataConnector};

/// Returns a fixed set of attributes for every request.
#[derive(Debug, Clone, Default)]
pub struct StaticDataConnector {
	attributes: AttributeMap,
}

impl StaticDataConnector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_attribute(mut self, attribute: Attribute) -> Self {
		self.attributes.insert(attribute.id().to_string(), attribute);
		self
	}
}

#[async_trait]
impl DataConnector for StaticDataConnector {
	async fn fetch(&self, _input: &ConnectorInput<'_>) -> Result<AttributeMap, ConnectorError> {
		Ok(self.attributes.clone())
	}
}
