// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filter policies and their attribute rules.

use crate::matcher::Matcher;
use crate::requirement::PolicyRequirement;

/// Whether a rule releases matching values or withholds them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleEffect {
	#[default]
	Permit,
	/// Removes matching values even if another rule permitted them.
	Deny,
}

/// A value matcher bound to one attribute id.
#[derive(Debug, Clone)]
pub struct AttributeRule {
	pub attribute_id: String,
	pub matcher: Matcher,
	pub effect: RuleEffect,
}

impl AttributeRule {
	pub fn permit(attribute_id: impl Into<String>, matcher: Matcher) -> Self {
		Self {
			attribute_id: attribute_id.into(),
			matcher,
			effect: RuleEffect::Permit,
		}
	}

	pub fn deny(attribute_id: impl Into<String>, matcher: Matcher) -> Self {
		Self {
			attribute_id: attribute_id.into(),
			matcher,
			effect: RuleEffect::Deny,
		}
	}
}

/// A named, conditionally active bundle of attribute rules.
#[derive(Debug, Clone)]
pub struct AttributeFilterPolicy {
	pub id: String,
	pub requirement: PolicyRequirement,
	pub rules: Vec<AttributeRule>,
}

impl AttributeFilterPolicy {
	pub fn new(id: impl Into<String>, requirement: PolicyRequirement) -> Self {
		Self {
			id: id.into(),
			requirement,
			rules: Vec::new(),
		}
	}

	pub fn with_rule(mut self, rule: AttributeRule) -> Self {
		self.rules.push(rule);
		self
	}

	/// Shorthand for adding a permit rule.
	pub fn permit(self, attribute_id: impl Into<String>, matcher: Matcher) -> Self {
		self.with_rule(AttributeRule::permit(attribute_id, matcher))
	}

	pub fn deny(self, attribute_id: impl Into<String>, matcher: Matcher) -> Self {
		self.with_rule(AttributeRule::deny(attribute_id, matcher))
	}
}
