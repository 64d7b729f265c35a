// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolver graph nodes.
//!
//! A node is either an attribute definition, which derives a single attribute
//! from its dependencies, or a data connector, which fetches a set of
//! attributes from some source. Both share the same dependency and
//! error-propagation model.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use loom_attr_core::{AttributeMap, AttributeValue, RequestContext};

use crate::error::{ConnectorError, DefinitionError};

/// Edge from a node to a node it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
	pub node_id: String,
	/// Selects a single attribute from the dependency's output.
	pub source_attribute_id: Option<String>,
}

impl Dependency {
	/// Depends on everything `node_id` produces.
	pub fn on(node_id: impl Into<String>) -> Self {
		Self {
			node_id: node_id.into(),
			source_attribute_id: None,
		}
	}

	/// Depends on one attribute of `node_id`'s output.
	pub fn attribute(node_id: impl Into<String>, attribute_id: impl Into<String>) -> Self {
		Self {
			node_id: node_id.into(),
			source_attribute_id: Some(attribute_id.into()),
		}
	}
}

/// Inputs handed to an [`AttributeDefinition`].
#[derive(Debug, Clone, Copy)]
pub struct DefinitionInput<'a> {
	/// Id of the definition being computed.
	pub id: &'a str,
	pub request: &'a RequestContext,
	/// Merged values of the definition's source attribute across dependencies.
	pub values: &'a [AttributeValue],
	/// Every attribute contributed by the dependencies, keyed by id.
	pub attributes: &'a AttributeMap,
}

/// Inputs handed to a [`DataConnector`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectorInput<'a> {
	pub request: &'a RequestContext,
	pub attributes: &'a AttributeMap,
}

/// Derives one attribute from already-resolved inputs.
pub trait AttributeDefinition: Send + Sync {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError>;
}

/// Fetches attributes from a source.
///
/// A fetch may be cancelled at any await point when the resolution is
/// abandoned or times out.
#[async_trait]
pub trait DataConnector: Send + Sync {
	async fn fetch(&self, input: &ConnectorInput<'_>) -> Result<AttributeMap, ConnectorError>;
}

#[derive(Clone)]
pub struct DefinitionNode {
	pub id: String,
	pub dependencies: Vec<Dependency>,
	pub propagate_errors: bool,
	/// Internal definitions feed other nodes but are never released.
	pub exported: bool,
	/// Attribute read from connector dependencies; defaults to `id`.
	pub source_attribute_id: Option<String>,
	pub definition: Arc<dyn AttributeDefinition>,
}

impl DefinitionNode {
	pub fn new(id: impl Into<String>, definition: impl AttributeDefinition + 'static) -> Self {
		Self {
			id: id.into(),
			dependencies: Vec::new(),
			propagate_errors: true,
			exported: true,
			source_attribute_id: None,
			definition: Arc::new(definition),
		}
	}

	pub fn depends_on(mut self, dependency: Dependency) -> Self {
		if !self.dependencies.contains(&dependency) {
			self.dependencies.push(dependency);
		}
		self
	}

	pub fn internal(mut self) -> Self {
		self.exported = false;
		self
	}

	pub fn propagate_errors(mut self, propagate: bool) -> Self {
		self.propagate_errors = propagate;
		self
	}

	pub fn with_source_attribute(mut self, attribute_id: impl Into<String>) -> Self {
		self.source_attribute_id = Some(attribute_id.into());
		self
	}

	pub fn source_attribute_id(&self) -> &str {
		self.source_attribute_id.as_deref().unwrap_or(&self.id)
	}
}

impl fmt::Debug for DefinitionNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DefinitionNode")
			.field("id", &self.id)
			.field("dependencies", &self.dependencies)
			.field("propagate_errors", &self.propagate_errors)
			.field("exported", &self.exported)
			.field("source_attribute_id", &self.source_attribute_id)
			.finish_non_exhaustive()
	}
}

#[derive(Clone)]
pub struct ConnectorNode {
	pub id: String,
	pub dependencies: Vec<Dependency>,
	pub propagate_errors: bool,
	pub failover_connector_id: Option<String>,
	/// Attributes released from this connector; `None` releases all of them.
	pub exported_attribute_ids: Option<Vec<String>>,
	pub connector: Arc<dyn DataConnector>,
}

impl ConnectorNode {
	pub fn new(id: impl Into<String>, connector: impl DataConnector + 'static) -> Self {
		Self::from_arc(id, Arc::new(connector))
	}

	pub fn from_arc(id: impl Into<String>, connector: Arc<dyn DataConnector>) -> Self {
		Self {
			id: id.into(),
			dependencies: Vec::new(),
			propagate_errors: true,
			failover_connector_id: None,
			exported_attribute_ids: None,
			connector,
		}
	}

	pub fn depends_on(mut self, dependency: Dependency) -> Self {
		if !self.dependencies.contains(&dependency) {
			self.dependencies.push(dependency);
		}
		self
	}

	pub fn propagate_errors(mut self, propagate: bool) -> Self {
		self.propagate_errors = propagate;
		self
	}

	pub fn with_failover(mut self, connector_id: impl Into<String>) -> Self {
		self.failover_connector_id = Some(connector_id.into());
		self
	}

	pub fn export_only<I, S>(mut self, attribute_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exported_attribute_ids = Some(attribute_ids.into_iter().map(Into::into).collect());
		self
	}

	/// Whether this connector releases `attribute_id`.
	pub fn exports(&self, attribute_id: &str) -> bool {
		match &self.exported_attribute_ids {
			Some(ids) => ids.iter().any(|id| id == attribute_id),
			None => true,
		}
	}

	pub fn exports_anything(&self) -> bool {
		self.exported_attribute_ids
			.as_ref()
			.map_or(true, |ids| !ids.is_empty())
	}
}

impl fmt::Debug for ConnectorNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectorNode")
			.field("id", &self.id)
			.field("dependencies", &self.dependencies)
			.field("propagate_errors", &self.propagate_errors)
			.field("failover_connector_id", &self.failover_connector_id)
			.field("exported_attribute_ids", &self.exported_attribute_ids)
			.finish_non_exhaustive()
	}
}

#[derive(Debug, Clone)]
pub enum Node {
	Definition(DefinitionNode),
	Connector(ConnectorNode),
}

impl Node {
	pub fn id(&self) -> &str {
		match self {
			Node::Definition(d) => &d.id,
			Node::Connector(c) => &c.id,
		}
	}

	pub fn dependencies(&self) -> &[Dependency] {
		match self {
			Node::Definition(d) => &d.dependencies,
			Node::Connector(c) => &c.dependencies,
		}
	}

	pub fn propagate_errors(&self) -> bool {
		match self {
			Node::Definition(d) => d.propagate_errors,
			Node::Connector(c) => c.propagate_errors,
		}
	}

	pub fn is_connector(&self) -> bool {
		matches!(self, Node::Connector(_))
	}
}

impl From<DefinitionNode> for Node {
	fn from(node: DefinitionNode) -> Self {
		Node::Definition(node)
	}
}

impl From<ConnectorNode> for Node {
	fn from(node: ConnectorNode) -> Self {
		Node::Connector(node)
	}
}
