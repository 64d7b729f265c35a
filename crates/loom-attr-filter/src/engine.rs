// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute filtering engine.
//!
//! Filtering is default-deny. A value is released only when at least one
//! active policy has a permit rule for its attribute whose matcher accepts it,
//! and no active deny rule for that attribute accepts it. Permits from
//! different policies are unioned.
//!
//! Matcher failures never abort a filter pass. A failing permit matcher does
//! not permit; a failing deny matcher denies. A failing requirement rule leaves
//! its policy inactive.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use loom_attr_core::{Attribute, AttributeMap, RequestContext};
use tracing::{debug, instrument, warn};

use crate::error::{FilterError, Result};
use crate::matcher::FilterContext;
use crate::policy::{AttributeFilterPolicy, RuleEffect};

/// Outcome details of a filter pass, for auditing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
	pub active_policies: Vec<String>,
	pub matcher_failures: usize,
}

/// Immutable set of filter policies, shared across requests.
#[derive(Debug, Clone)]
pub struct AttributeFilter {
	policies: Arc<[AttributeFilterPolicy]>,
}

#[derive(Default)]
struct ValueMask {
	permitted: Vec<bool>,
	denied: Vec<bool>,
}

impl ValueMask {
	fn new(len: usize) -> Self {
		Self {
			permitted: vec![false; len],
			denied: vec![false; len],
		}
	}
}

impl AttributeFilter {
	/// Builds a filter, rejecting duplicate policy ids.
	pub fn new(policies: Vec<AttributeFilterPolicy>) -> Result<Self> {
		let mut seen = HashSet::new();
		for policy in &policies {
			if !seen.insert(policy.id.as_str()) {
				return Err(FilterError::DuplicatePolicy(policy.id.clone()));
			}
		}
		Ok(Self {
			policies: policies.into(),
		})
	}

	pub fn policies(&self) -> &[AttributeFilterPolicy] {
		&self.policies
	}

	/// Returns the subset of `attributes` that may be disclosed for `request`.
	pub fn filter(&self, attributes: AttributeMap, request: &RequestContext) -> AttributeMap {
		self.filter_with_report(attributes, request).0
	}

	#[instrument(
		level = "debug",
		skip(self, attributes, request),
		fields(requester = ?request.requester, attribute_count = attributes.len())
	)]
	pub fn filter_with_report(
		&self,
		attributes: AttributeMap,
		request: &RequestContext,
	) -> (AttributeMap, FilterReport) {
		let mut report = FilterReport::default();
		let ctx = FilterContext::new(request, &attributes);

		let active: Vec<&AttributeFilterPolicy> = self
			.policies
			.iter()
			.filter(|policy| match policy.requirement.matches(&ctx) {
				Ok(active) => active,
				Err(e) => {
					warn!(policy = %policy.id, error = %e, "policy requirement failed, treating as inactive");
					report.matcher_failures += 1;
					false
				}
			})
			.collect();

		report.active_policies = active.iter().map(|p| p.id.clone()).collect();
		debug!(active = ?report.active_policies, "evaluated policy requirements");

		let mut masks: HashMap<&str, ValueMask> = HashMap::new();
		for policy in &active {
			for rule in &policy.rules {
				let Some((key, attribute)) = attributes.get_key_value(&rule.attribute_id) else {
					continue;
				};
				let mask = masks
					.entry(key.as_str())
					.or_insert_with(|| ValueMask::new(attribute.len()));

				for (idx, value) in attribute.values().iter().enumerate() {
					match rule.effect {
						RuleEffect::Permit if mask.permitted[idx] => {}
						RuleEffect::Deny if mask.denied[idx] => {}
						effect => {
							let hit = match rule.matcher.matches(value, &ctx) {
								Ok(hit) => hit,
								Err(e) => {
									warn!(
										policy = %policy.id,
										attribute = %rule.attribute_id,
										error = %e,
										"matcher failed, value withheld"
									);
									report.matcher_failures += 1;
									effect == RuleEffect::Deny
								}
							};
							if hit {
								match effect {
									RuleEffect::Permit => mask.permitted[idx] = true,
									RuleEffect::Deny => mask.denied[idx] = true,
								}
							}
						}
					}
				}
			}
		}

		let mut released = AttributeMap::new();
		for (id, mask) in masks {
			let Some(attribute) = attributes.get(id) else {
				continue;
			};
			let values = attribute
				.values()
				.iter()
				.enumerate()
				.filter(|(idx, _)| mask.permitted[*idx] && !mask.denied[*idx])
				.map(|(_, value)| value.clone());
			let filtered = Attribute::with_values(attribute.id(), values);

			if filtered.is_empty() {
				debug!(attribute = %id, "no values released");
				continue;
			}
			debug!(attribute = %id, released = filtered.len(), of = attribute.len(), "attribute released");
			released.insert(id.to_string(), filtered);
		}

		(released, report)
	}
}
