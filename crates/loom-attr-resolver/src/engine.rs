// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute resolution engine.
//!
//! Resolution walks the graph from the nodes that can produce the requested
//! attributes. Independent dependencies are resolved concurrently, every node
//! runs at most once per request, and connector fetches are bounded by a
//! shared limit and a per-fetch timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use loom_attr_config::ResolverSettings;
use loom_attr_core::{Attribute, AttributeMap, RequestContext};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::context::{NodeOutcome, ResolutionContext};
use crate::error::{ConnectorError, ResolutionError};
use crate::graph::ResolverGraph;
use crate::node::{ConnectorInput, ConnectorNode, DefinitionInput, DefinitionNode, Dependency, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
	pub max_concurrent_fetches: usize,
	pub fetch_timeout: Duration,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self::from(&ResolverSettings::default())
	}
}

impl From<&ResolverSettings> for ResolverConfig {
	fn from(settings: &ResolverSettings) -> Self {
		Self {
			max_concurrent_fetches: settings.max_concurrent_fetches,
			fetch_timeout: settings.fetch_timeout,
		}
	}
}

/// One call to [`AttributeResolver::resolve`].
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
	pub request: RequestContext,
	/// Attributes wanted by the caller; empty means every exported attribute.
	pub requested_attribute_ids: Vec<String>,
	/// Overrides the engine's fetch timeout for this request.
	pub fetch_timeout: Option<Duration>,
}

impl ResolutionRequest {
	pub fn new(request: RequestContext) -> Self {
		Self {
			request,
			requested_attribute_ids: Vec::new(),
			fetch_timeout: None,
		}
	}

	pub fn with_requested<I, S>(mut self, attribute_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.requested_attribute_ids = attribute_ids.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
		self.fetch_timeout = Some(timeout);
		self
	}
}

/// Result of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
	/// Exported attributes with at least one value.
	pub attributes: AttributeMap,
	/// Per-node outcomes recorded while resolving.
	pub context: ResolutionContext,
}

/// Resolves attributes over a validated graph.
///
/// The resolver is immutable and cheap to clone; one instance serves any
/// number of concurrent requests. Dropping a `resolve` future cancels every
/// fetch it started.
#[derive(Debug, Clone)]
pub struct AttributeResolver {
	graph: Arc<ResolverGraph>,
	config: ResolverConfig,
	fetch_permits: Arc<Semaphore>,
}

impl AttributeResolver {
	pub fn new(graph: ResolverGraph, config: ResolverConfig) -> Self {
		let permits = config.max_concurrent_fetches.max(1);
		Self {
			graph: Arc::new(graph),
			config,
			fetch_permits: Arc::new(Semaphore::new(permits)),
		}
	}

	pub fn graph(&self) -> &ResolverGraph {
		&self.graph
	}

	pub fn config(&self) -> &ResolverConfig {
		&self.config
	}

	#[instrument(
		skip_all,
		fields(
			principal = %request.request.principal,
			requester = ?request.request.requester,
			requested = request.requested_attribute_ids.len()
		)
	)]
	pub async fn resolve(&self, request: ResolutionRequest) -> Result<Resolution, ResolutionError> {
		let ResolutionRequest {
			request,
			requested_attribute_ids,
			fetch_timeout,
		} = request;
		let context = ResolutionContext::new(request, requested_attribute_ids);
		let started = Instant::now();

		let attributes = {
			let run = Run {
				graph: &self.graph,
				permits: &self.fetch_permits,
				ctx: &context,
				fetch_timeout: fetch_timeout.unwrap_or(self.config.fetch_timeout),
			};
			run.execute().await
		};

		match attributes {
			Ok(attributes) => {
				info!(
					attributes = attributes.len(),
					nodes_evaluated = context.evaluated_node_ids().len(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					"attribute resolution complete"
				);
				Ok(Resolution {
					attributes,
					context,
				})
			}
			Err(err) => {
				warn!(error = %err, "attribute resolution failed");
				Err(err)
			}
		}
	}
}

struct Run<'a> {
	graph: &'a ResolverGraph,
	permits: &'a Semaphore,
	ctx: &'a ResolutionContext,
	fetch_timeout: Duration,
}

impl<'a> Run<'a> {
	async fn execute(&self) -> Result<AttributeMap, ResolutionError> {
		let requested = self.ctx.requested_attribute_ids();
		let roots = self.roots(requested);

		let outputs =
			try_join_all(roots.iter().map(|node| self.resolve_node(node.id()))).await?;

		let mut released = AttributeMap::new();
		for (node, output) in roots.iter().zip(&outputs) {
			if let Node::Definition(def) = node {
				if !def.exported {
					continue;
				}
				if let Some(attr) = output.get(&def.id) {
					merge_into(&mut released, attr);
				}
			}
		}
		for (node, output) in roots.iter().zip(&outputs) {
			if let Node::Connector(conn) = node {
				for attr in output.values() {
					if conn.exports(attr.id()) {
						merge_into(&mut released, attr);
					}
				}
			}
		}

		if !requested.is_empty() {
			released.retain(|id, _| requested.contains(id));
		}
		released.retain(|_, attr| !attr.is_empty());
		Ok(released)
	}

	fn roots(&self, requested: &'a [String]) -> Vec<&'a Node> {
		if requested.is_empty() {
			return self.graph.exported_nodes().collect();
		}

		let mut roots: Vec<&'a Node> = Vec::new();
		for attribute_id in requested {
			let mut produced = false;
			for node in self.graph.producers_of(attribute_id) {
				produced = true;
				if !roots.iter().any(|r| r.id() == node.id()) {
					roots.push(node);
				}
			}
			if !produced {
				debug!(attribute = %attribute_id, "no node produces requested attribute");
			}
		}
		roots
	}

	fn resolve_node<'s>(
		&'s self,
		id: &'s str,
	) -> BoxFuture<'s, Result<Arc<AttributeMap>, ResolutionError>> {
		async move {
			let node = self
				.graph
				.node(id)
				.ok_or_else(|| ResolutionError::UnknownNode(id.to_string()))?;

			let cell = self.ctx.cell(id);
			let outcome = cell.get_or_init(|| self.evaluate(node)).await;
			outcome.clone().into_result()
		}
		.boxed()
	}

	async fn evaluate(&self, node: &Node) -> NodeOutcome {
		let outputs = match try_join_all(
			node.dependencies()
				.iter()
				.map(|dep| self.resolve_node(&dep.node_id)),
		)
		.await
		{
			Ok(outputs) => outputs,
			Err(err) => return NodeOutcome::Failed(err),
		};

		let result = match node {
			Node::Definition(def) => self.compute(def, &outputs),
			Node::Connector(conn) => self.fetch(conn, &outputs).await,
		};

		match result {
			Ok(map) => NodeOutcome::Resolved(Arc::new(map)),
			Err(err) => self.recover(node, err).await,
		}
	}

	async fn recover(&self, node: &Node, err: ResolutionError) -> NodeOutcome {
		if let Node::Connector(conn) = node {
			if let Some(failover) = conn.failover_connector_id.as_deref() {
				warn!(connector = %conn.id, failover, error = %err, "connector failed, using failover");
				return match self.resolve_node(failover).await {
					Ok(map) => NodeOutcome::Resolved(map),
					Err(failover_err) => NodeOutcome::Failed(failover_err),
				};
			}
		}

		if node.propagate_errors() {
			NodeOutcome::Failed(err)
		} else {
			warn!(node = %node.id(), error = %err, "node failed, continuing without its values");
			NodeOutcome::Suppressed(err)
		}
	}

	fn compute(
		&self,
		node: &DefinitionNode,
		outputs: &[Arc<AttributeMap>],
	) -> Result<AttributeMap, ResolutionError> {
		let source_id = node.source_attribute_id();
		let mut values = Attribute::new(source_id);
		let mut attributes = AttributeMap::new();

		for (dep, output) in node.dependencies.iter().zip(outputs) {
			match &dep.source_attribute_id {
				Some(attribute_id) => {
					if let Some(attr) = output.get(attribute_id) {
						values.extend(attr.values().iter().cloned());
						merge_into(&mut attributes, attr);
					}
				}
				None => {
					for attr in output.values() {
						merge_into(&mut attributes, attr);
					}
					let selected = match self.graph.node(&dep.node_id) {
						Some(Node::Definition(_)) => output.get(&dep.node_id),
						_ => output.get(source_id),
					};
					if let Some(attr) = selected {
						values.extend(attr.values().iter().cloned());
					}
				}
			}
		}

		let input = DefinitionInput {
			id: &node.id,
			request: self.ctx.request(),
			values: values.values(),
			attributes: &attributes,
		};
		let computed = node
			.definition
			.compute(&input)
			.map_err(|e| ResolutionError::definition(&node.id, e))?;

		debug!(definition = %node.id, values = computed.len(), "definition computed");
		let mut out = AttributeMap::new();
		out.insert(node.id.clone(), Attribute::with_values(node.id.clone(), computed));
		Ok(out)
	}

	async fn fetch(
		&self,
		node: &ConnectorNode,
		outputs: &[Arc<AttributeMap>],
	) -> Result<AttributeMap, ResolutionError> {
		let attributes = connector_inputs(&node.dependencies, outputs);

		let _permit = self.permits.acquire().await.map_err(|_| {
			ResolutionError::connector(&node.id, ConnectorError::backend("fetch limiter closed"))
		})?;

		let input = ConnectorInput {
			request: self.ctx.request(),
			attributes: &attributes,
		};
		let started = Instant::now();
		match tokio::time::timeout(self.fetch_timeout, node.connector.fetch(&input)).await {
			Ok(Ok(map)) => {
				debug!(
					connector = %node.id,
					attributes = map.len(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					"connector fetched"
				);
				Ok(map)
			}
			Ok(Err(err)) => Err(ResolutionError::connector(&node.id, err)),
			Err(_) => Err(ResolutionError::connector(
				&node.id,
				ConnectorError::Timeout(self.fetch_timeout),
			)),
		}
	}
}

fn connector_inputs(dependencies: &[Dependency], outputs: &[Arc<AttributeMap>]) -> AttributeMap {
	let mut attributes = AttributeMap::new();
	for (dep, output) in dependencies.iter().zip(outputs) {
		match &dep.source_attribute_id {
			Some(attribute_id) => {
				if let Some(attr) = output.get(attribute_id) {
					merge_into(&mut attributes, attr);
				}
			}
			None => {
				for attr in output.values() {
					merge_into(&mut attributes, attr);
				}
			}
		}
	}
	attributes
}

fn merge_into(target: &mut AttributeMap, attr: &Attribute) {
	target
		.entry(attr.id().to_string())
		.or_insert_with(|| Attribute::new(attr.id()))
		.extend(attr.values().iter().cloned());
}
