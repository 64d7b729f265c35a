// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end filtering scenarios.

use loom_attr_core::{Attribute, AttributeMap, RequestContext};
use loom_attr_filter::{AttributeFilter, AttributeFilterPolicy, Matcher, PolicyRequirement};

fn resolved() -> AttributeMap {
	let mut map = AttributeMap::new();
	map.insert("uid".to_string(), Attribute::from_strings("uid", ["alice", "bob"]));
	map.insert(
		"role".to_string(),
		Attribute::from_strings("role", ["admin", "administrator", "Admin"]),
	);
	map.insert(
		"eppn".to_string(),
		Attribute::from_strings("eppn", ["alice@example.org"]),
	);
	map
}

#[test]
fn inactive_policy_does_not_contribute() {
	let filter = AttributeFilter::new(vec![
		AttributeFilterPolicy::new("p1", PolicyRequirement::requester("sp-one"))
			.permit("uid", Matcher::exact("alice")),
		AttributeFilterPolicy::new("p2", PolicyRequirement::requester("sp-two"))
			.permit("uid", Matcher::exact("bob")),
	])
	.unwrap();

	let request = RequestContext::new("alice").with_requester("sp-one");
	let (out, report) = filter.filter_with_report(resolved(), &request);

	assert_eq!(out["uid"].display_values(), vec!["alice"]);
	assert_eq!(report.active_policies, vec!["p1".to_string()]);
}

#[test]
fn case_insensitive_matcher_is_exact_apart_from_case() {
	let filter = AttributeFilter::new(vec![
		AttributeFilterPolicy::new("roles", PolicyRequirement::Any)
			.permit("role", Matcher::case_insensitive("Admin")),
	])
	.unwrap();

	let out = filter.filter(resolved(), &RequestContext::new("alice"));
	assert_eq!(out["role"].display_values(), vec!["admin", "Admin"]);
}

#[test]
fn resolved_but_unpermitted_attribute_is_never_released() {
	let filter = AttributeFilter::new(vec![
		AttributeFilterPolicy::new("everything-for-uid", PolicyRequirement::Any)
			.permit("uid", Matcher::Any),
	])
	.unwrap();

	let input = resolved();
	assert!(input.contains_key("eppn"));
	let out = filter.filter(input, &RequestContext::new("alice"));
	assert!(!out.contains_key("eppn"));
	assert!(!out.contains_key("role"));
}

#[test]
fn no_policies_release_nothing() {
	let filter = AttributeFilter::new(Vec::new()).unwrap();
	assert!(filter.filter(resolved(), &RequestContext::new("alice")).is_empty());
}

#[test]
fn attribute_based_requirement_gates_release() {
	let filter = AttributeFilter::new(vec![AttributeFilterPolicy::new(
		"admins-only",
		PolicyRequirement::attribute_value("role", Matcher::exact("administrator")),
	)
	.permit("eppn", Matcher::regex(r".*@example\.org").unwrap())])
	.unwrap();

	let out = filter.filter(resolved(), &RequestContext::new("alice"));
	assert_eq!(out["eppn"].display_values(), vec!["alice@example.org"]);

	let mut without_role = resolved();
	without_role.remove("role");
	assert!(filter.filter(without_role, &RequestContext::new("alice")).is_empty());
}
