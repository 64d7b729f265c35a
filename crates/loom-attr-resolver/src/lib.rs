// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute resolution for the Loom attribute engine.
//!
//! Attributes are produced by a graph of nodes: data connectors fetch raw
//! attributes from sources, and attribute definitions derive attributes from
//! the outputs of other nodes. The graph is validated once at construction
//! and then shared by every request.
//!
//! # Example
//!
//! ```
//! use loom_attr_core::{Attribute, RequestContext};
//! use loom_attr_resolver::{
//!     AttributeResolver, ConnectorNode, DefinitionNode, Dependency, ResolutionRequest,
//!     ResolverConfig, ResolverGraph,
//!     connectors::StaticDataConnector,
//!     definitions::SimpleDefinition,
//! };
//!
//! # tokio_test::block_on(async {
//! let directory = StaticDataConnector::new()
//!     .with_attribute(Attribute::from_strings("uid", ["alice"]));
//!
//! let graph = ResolverGraph::builder()
//!     .connector(ConnectorNode::new("directory", directory).export_only(Vec::<String>::new()))
//!     .definition(DefinitionNode::new("uid", SimpleDefinition).depends_on(Dependency::on("directory")))
//!     .build()
//!     .unwrap();
//!
//! let resolver = AttributeResolver::new(graph, ResolverConfig::default());
//! let resolution = resolver
//!     .resolve(ResolutionRequest::new(RequestContext::new("alice")))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(resolution.attributes["uid"].display_values(), vec!["alice"]);
//! # });
//! ```

pub mod connectors;
pub mod context;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod graph;
pub mod node;
pub mod pairwise;

pub use context::{NodeOutcome, ResolutionContext};
pub use engine::{AttributeResolver, Resolution, ResolutionRequest, ResolverConfig};
pub use error::{
	ConnectorError, DefinitionError, GraphError, ResolutionError, Result, StoreError, StoreErrorKind,
};
pub use graph::{ResolverGraph, ResolverGraphBuilder};
pub use node::{
	AttributeDefinition, ConnectorInput, ConnectorNode, DataConnector, DefinitionInput, DefinitionNode,
	Dependency, Node,
};
pub use pairwise::PairwiseIdStore;
