// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pairwise identifiers resolved through the graph and released by policy.

use std::sync::Arc;

use futures::future::join_all;
use loom_attr_config::Salt;
use loom_attr_core::{Attribute, RequestContext};
use loom_attr_filter::{AttributeFilter, AttributeFilterPolicy, Matcher, PolicyRequirement};
use loom_attr_resolver::connectors::StaticDataConnector;
use loom_attr_resolver::definitions::SimpleDefinition;
use loom_attr_resolver::pairwise::{
	ComputedIdGenerator, InMemoryPairwiseIdBackend, InitialIdSource, PairwiseIdConnector,
	StoredPairwiseIdStore,
};
use loom_attr_resolver::{
	AttributeResolver, ConnectorNode, DefinitionNode, Dependency, PairwiseIdStore, ResolutionRequest,
	ResolverConfig, ResolverGraph,
};

const SP: &str = "https://sp.example.org";

fn graph(store: Arc<dyn PairwiseIdStore>) -> ResolverGraph {
	let directory = StaticDataConnector::new()
		.with_attribute(Attribute::from_strings("uid", ["alice"]))
		.with_attribute(Attribute::from_strings("mail", ["alice@example.org"]));

	ResolverGraph::builder()
		.connector(ConnectorNode::new("directory", directory).export_only(["mail"]))
		.definition(DefinitionNode::new("uid", SimpleDefinition).depends_on(Dependency::on("directory")))
		.connector(
			ConnectorNode::new("pairwise", PairwiseIdConnector::new("pairwiseId", store).with_source_attribute("uid"))
				.depends_on(Dependency::on("uid")),
		)
		.build()
		.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_agree_on_stored_identifier() {
	let store = Arc::new(StoredPairwiseIdStore::new(
		InMemoryPairwiseIdBackend::new(),
		InitialIdSource::Random,
	));
	let resolver = AttributeResolver::new(graph(store.clone()), ResolverConfig::default());

	let resolutions = join_all((0..16).map(|_| {
		let resolver = resolver.clone();
		tokio::spawn(async move {
			resolver
				.resolve(
					ResolutionRequest::new(RequestContext::new("alice").with_requester(SP))
						.with_requested(["pairwiseId"]),
				)
				.await
		})
	}))
	.await;

	let ids: Vec<String> = resolutions
		.into_iter()
		.map(|r| r.unwrap().unwrap().attributes["pairwiseId"].display_values()[0].clone())
		.collect();
	assert!(ids.windows(2).all(|w| w[0] == w[1]));
	assert_eq!(store.backend().active_count().await, 1);
}

#[tokio::test]
async fn filtered_release_for_matching_requester() {
	let generator = ComputedIdGenerator::new(Salt::new(b"0123456789abcdef".to_vec()));
	let store = Arc::new(StoredPairwiseIdStore::new(
		InMemoryPairwiseIdBackend::new(),
		InitialIdSource::Computed(generator.clone()),
	));
	let resolver = AttributeResolver::new(graph(store), ResolverConfig::default());

	let request = RequestContext::new("alice").with_requester(SP);
	let resolution = resolver
		.resolve(ResolutionRequest::new(request.clone()))
		.await
		.unwrap();
	assert_eq!(resolution.attributes.len(), 3);

	let filter = AttributeFilter::new(vec![
		AttributeFilterPolicy::new("sp", PolicyRequirement::requester(SP))
			.permit("pairwiseId", Matcher::Any)
			.permit("uid", Matcher::Any),
		AttributeFilterPolicy::new("other", PolicyRequirement::requester("https://other.example"))
			.permit("mail", Matcher::Any),
	])
	.unwrap();

	let released = filter.filter(resolution.attributes, &request);
	assert_eq!(released.len(), 2);
	assert_eq!(
		released["pairwiseId"].display_values(),
		vec![generator.generate(SP, "alice")]
	);
	assert!(!released.contains_key("mail"));
}
