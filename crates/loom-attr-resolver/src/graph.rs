// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validated, immutable resolver graph.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::node::{ConnectorNode, DefinitionNode, Node};

/// Collects nodes before validation.
#[derive(Debug, Default)]
pub struct ResolverGraphBuilder {
	nodes: Vec<Node>,
}

impl ResolverGraphBuilder {
	pub fn definition(mut self, node: DefinitionNode) -> Self {
		self.nodes.push(Node::Definition(node));
		self
	}

	pub fn connector(mut self, node: ConnectorNode) -> Self {
		self.nodes.push(Node::Connector(node));
		self
	}

	pub fn node(mut self, node: impl Into<Node>) -> Self {
		self.nodes.push(node.into());
		self
	}

	pub fn build(self) -> Result<ResolverGraph, GraphError> {
		ResolverGraph::new(self.nodes)
	}
}

/// A dependency graph that has passed validation.
///
/// Construction guarantees unique ids, resolvable dependencies, failovers
/// that name other data connectors, and the absence of cycles through either
/// dependency or failover edges. [`ResolverGraph::new`] (directly or through
/// the builder) is the only constructor, so the resolver never re-checks for
/// cycles while walking the graph.
#[derive(Debug)]
pub struct ResolverGraph {
	nodes: Vec<Node>,
	index: HashMap<String, usize>,
	failover_targets: HashSet<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	Visiting,
	Done,
}

impl ResolverGraph {
	pub fn builder() -> ResolverGraphBuilder {
		ResolverGraphBuilder::default()
	}

	#[instrument(skip_all, fields(node_count = nodes.len()))]
	pub fn new(nodes: Vec<Node>) -> Result<Self, GraphError> {
		let mut index = HashMap::with_capacity(nodes.len());
		for (idx, node) in nodes.iter().enumerate() {
			if index.insert(node.id().to_string(), idx).is_some() {
				return Err(GraphError::DuplicateId(node.id().to_string()));
			}
		}

		let mut failover_targets = HashSet::new();
		for node in &nodes {
			for dep in node.dependencies() {
				if !index.contains_key(&dep.node_id) {
					return Err(GraphError::UnknownDependency {
						node: node.id().to_string(),
						dependency: dep.node_id.clone(),
					});
				}
			}

			if let Node::Connector(connector) = node {
				if let Some(failover) = &connector.failover_connector_id {
					match index.get(failover).map(|&i| &nodes[i]) {
						None => {
							return Err(GraphError::UnknownFailover {
								node: connector.id.clone(),
								failover: failover.clone(),
							})
						}
						Some(target) if !target.is_connector() => {
							return Err(GraphError::FailoverNotConnector {
								node: connector.id.clone(),
								failover: failover.clone(),
							})
						}
						Some(_) => {
							failover_targets.insert(failover.clone());
						}
					}
				}
			}
		}

		let graph = Self {
			nodes,
			index,
			failover_targets,
		};
		graph.check_acyclic()?;

		debug!(
			definitions = graph.definitions().count(),
			connectors = graph.connectors().count(),
			"resolver graph validated"
		);
		Ok(graph)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Nodes in registration order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn definitions(&self) -> impl Iterator<Item = &DefinitionNode> {
		self.nodes.iter().filter_map(|n| match n {
			Node::Definition(d) => Some(d),
			Node::Connector(_) => None,
		})
	}

	pub fn connectors(&self) -> impl Iterator<Item = &ConnectorNode> {
		self.nodes.iter().filter_map(|n| match n {
			Node::Connector(c) => Some(c),
			Node::Definition(_) => None,
		})
	}

	/// Whether some connector names `id` as its failover.
	pub fn is_failover_target(&self, id: &str) -> bool {
		self.failover_targets.contains(id)
	}

	/// Nodes whose output can contribute to `attribute_id`.
	///
	/// Connectors that exist only as another connector's failover are never
	/// resolved on their own.
	pub(crate) fn producers_of<'a>(
		&'a self,
		attribute_id: &'a str,
	) -> impl Iterator<Item = &'a Node> + 'a {
		self.nodes.iter().filter(move |node| match node {
			Node::Definition(d) => d.id == attribute_id,
			Node::Connector(c) => !self.is_failover_target(&c.id) && c.exports(attribute_id),
		})
	}

	/// Nodes released when no specific attributes are requested.
	pub(crate) fn exported_nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter().filter(move |node| match node {
			Node::Definition(d) => d.exported,
			Node::Connector(c) => !self.is_failover_target(&c.id) && c.exports_anything(),
		})
	}

	fn successors<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a str> + 'a {
		let failover = match node {
			Node::Connector(c) => c.failover_connector_id.as_deref(),
			Node::Definition(_) => None,
		};
		node.dependencies()
			.iter()
			.map(|d| d.node_id.as_str())
			.chain(failover)
	}

	fn check_acyclic(&self) -> Result<(), GraphError> {
		let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());
		let mut path = Vec::new();
		for node in &self.nodes {
			self.visit(node.id(), &mut marks, &mut path)?;
		}
		Ok(())
	}

	fn visit<'a>(
		&'a self,
		id: &'a str,
		marks: &mut HashMap<&'a str, Mark>,
		path: &mut Vec<&'a str>,
	) -> Result<(), GraphError> {
		match marks.get(id) {
			Some(Mark::Done) => return Ok(()),
			Some(Mark::Visiting) => {
				let start = path.iter().position(|p| *p == id).unwrap_or(0);
				let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
				cycle.push(id.to_string());
				return Err(GraphError::Cycle { path: cycle });
			}
			None => {}
		}

		let Some(node) = self.node(id) else {
			return Ok(());
		};

		marks.insert(id, Mark::Visiting);
		path.push(id);
		for next in self.successors(node) {
			self.visit(next, marks, path)?;
		}
		path.pop();
		marks.insert(id, Mark::Done);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::connectors::StaticDataConnector;
	use crate::definitions::SimpleDefinition;
	use crate::node::Dependency;

	fn def(id: &str, deps: &[&str]) -> DefinitionNode {
		deps.iter().fold(DefinitionNode::new(id, SimpleDefinition), |n, d| {
			n.depends_on(Dependency::on(*d))
		})
	}

	fn conn(id: &str) -> ConnectorNode {
		ConnectorNode::new(id, StaticDataConnector::default())
	}

	#[test]
	fn accepts_diamond() {
		let graph = ResolverGraph::builder()
			.connector(conn("c"))
			.definition(def("a", &["c"]))
			.definition(def("b", &["c"]))
			.definition(def("d", &["a", "b"]))
			.build()
			.unwrap();
		assert_eq!(graph.nodes().len(), 4);
	}

	#[test]
	fn rejects_duplicate_ids() {
		let err = ResolverGraph::builder()
			.definition(def("a", &[]))
			.connector(conn("a"))
			.build()
			.unwrap_err();
		assert_eq!(err, GraphError::DuplicateId("a".into()));
	}

	#[test]
	fn rejects_unknown_dependency() {
		let err = ResolverGraph::builder()
			.definition(def("a", &["ghost"]))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::UnknownDependency { ref dependency, .. } if dependency == "ghost"));
	}

	#[test]
	fn rejects_two_node_cycle() {
		let err = ResolverGraph::builder()
			.definition(def("a", &["b"]))
			.definition(def("b", &["a"]))
			.build()
			.unwrap_err();
		assert_eq!(
			err,
			GraphError::Cycle {
				path: vec!["a".into(), "b".into(), "a".into()]
			}
		);
	}

	#[test]
	fn rejects_self_dependency() {
		let err = ResolverGraph::builder()
			.definition(def("a", &["a"]))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::Cycle { .. }));
	}

	#[test]
	fn rejects_cycle_through_failover() {
		let err = ResolverGraph::builder()
			.connector(conn("primary").with_failover("backup"))
			.connector(conn("backup").depends_on(Dependency::on("primary")))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::Cycle { .. }));
	}

	#[test]
	fn rejects_failover_to_definition() {
		let err = ResolverGraph::builder()
			.definition(def("a", &[]))
			.connector(conn("primary").with_failover("a"))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::FailoverNotConnector { .. }));
	}

	#[test]
	fn rejects_unknown_failover() {
		let err = ResolverGraph::builder()
			.connector(conn("primary").with_failover("nowhere"))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::UnknownFailover { .. }));
	}

	#[test]
	fn failover_targets_are_not_roots() {
		let graph = ResolverGraph::builder()
			.connector(conn("primary").with_failover("backup"))
			.connector(conn("backup"))
			.build()
			.unwrap();
		let roots: Vec<&str> = graph.exported_nodes().map(Node::id).collect();
		assert_eq!(roots, vec!["primary"]);
		assert!(graph.is_failover_target("backup"));
	}

	#[test]
	fn producers_respect_export_lists() {
		let graph = ResolverGraph::builder()
			.connector(conn("ldap").export_only(["mail"]))
			.connector(conn("everything"))
			.definition(def("uid", &["ldap"]).internal())
			.build()
			.unwrap();

		let mail: Vec<&str> = graph.producers_of("mail").map(Node::id).collect();
		assert_eq!(mail, vec!["ldap", "everything"]);

		let uid: Vec<&str> = graph.producers_of("uid").map(Node::id).collect();
		assert_eq!(uid, vec!["everything", "uid"]);

		let exported: Vec<&str> = graph.exported_nodes().map(Node::id).collect();
		assert_eq!(exported, vec!["ldap", "everything"]);
	}
}
