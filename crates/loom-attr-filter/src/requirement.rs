// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy requirement rules: predicates over the request, not over values.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{FilterError, Result};
use crate::matcher::{FilterContext, FullRegex, Matcher};
use crate::string_match::StringMatch;

/// Externally supplied request predicate.
#[derive(Clone)]
pub struct CustomRequirement {
	pub name: String,
	predicate: Arc<dyn Fn(&FilterContext<'_>) -> Result<bool> + Send + Sync>,
}

impl CustomRequirement {
	pub fn new<F>(name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&FilterContext<'_>) -> Result<bool> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			predicate: Arc::new(f),
		}
	}

	fn test(&self, ctx: &FilterContext<'_>) -> Result<bool> {
		catch_unwind(AssertUnwindSafe(|| (self.predicate)(ctx)))
			.unwrap_or_else(|_| Err(FilterError::matcher(&self.name, "predicate panicked")))
	}
}

impl fmt::Debug for CustomRequirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomRequirement")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Decides whether a filter policy applies to a request.
#[derive(Debug, Clone)]
pub enum PolicyRequirement {
	/// Always active.
	Any,
	/// Never active.
	None,
	Requester(StringMatch),
	RequesterRegex(FullRegex),
	Principal(StringMatch),
	PrincipalRegex(FullRegex),
	/// Active when some value of a resolved attribute matches.
	AttributeValue {
		attribute_id: String,
		matcher: Box<Matcher>,
	},
	/// Active when the resolved attribute has between `min` and `max` values.
	ValueCount {
		attribute_id: String,
		min: usize,
		max: Option<usize>,
	},
	/// Active when request metadata holds exactly this value.
	Metadata {
		key: String,
		value: serde_json::Value,
	},
	And(Vec<PolicyRequirement>),
	Or(Vec<PolicyRequirement>),
	Not(Box<PolicyRequirement>),
	Custom(CustomRequirement),
}

impl PolicyRequirement {
	pub fn requester(requester: impl Into<String>) -> Self {
		Self::Requester(StringMatch::exact(requester))
	}

	pub fn requester_regex(pattern: impl Into<String>) -> Result<Self> {
		Ok(Self::RequesterRegex(FullRegex::new(pattern)?))
	}

	pub fn principal(principal: impl Into<String>) -> Self {
		Self::Principal(StringMatch::exact(principal))
	}

	pub fn principal_regex(pattern: impl Into<String>) -> Result<Self> {
		Ok(Self::PrincipalRegex(FullRegex::new(pattern)?))
	}

	pub fn attribute_value(attribute_id: impl Into<String>, matcher: Matcher) -> Self {
		Self::AttributeValue {
			attribute_id: attribute_id.into(),
			matcher: Box::new(matcher),
		}
	}

	pub fn and(children: impl IntoIterator<Item = PolicyRequirement>) -> Self {
		Self::And(children.into_iter().collect())
	}

	pub fn or(children: impl IntoIterator<Item = PolicyRequirement>) -> Self {
		Self::Or(children.into_iter().collect())
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(child: PolicyRequirement) -> Self {
		Self::Not(Box::new(child))
	}

	pub fn custom<F>(name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&FilterContext<'_>) -> Result<bool> + Send + Sync + 'static,
	{
		Self::Custom(CustomRequirement::new(name, f))
	}

	/// Evaluates this rule against the request.
	pub fn matches(&self, ctx: &FilterContext<'_>) -> Result<bool> {
		match self {
			Self::Any => Ok(true),
			Self::None => Ok(false),
			Self::Requester(m) => Ok(ctx.request.requester.as_deref().is_some_and(|r| m.matches(r))),
			Self::RequesterRegex(re) => {
				Ok(ctx.request.requester.as_deref().is_some_and(|r| re.is_match(r)))
			}
			Self::Principal(m) => Ok(m.matches(&ctx.request.principal)),
			Self::PrincipalRegex(re) => Ok(re.is_match(&ctx.request.principal)),
			Self::AttributeValue {
				attribute_id,
				matcher,
			} => {
				let Some(attribute) = ctx.attributes.get(attribute_id) else {
					return Ok(false);
				};
				for value in attribute.values() {
					if matcher.matches(value, ctx)? {
						return Ok(true);
					}
				}
				Ok(false)
			}
			Self::ValueCount {
				attribute_id,
				min,
				max,
			} => {
				let count = ctx.attributes.get(attribute_id).map_or(0, |a| a.len());
				Ok(count >= *min && max.map_or(true, |max| count <= max))
			}
			Self::Metadata { key, value } => Ok(ctx.request.metadata(key) == Some(value)),
			Self::And(children) => {
				for child in children {
					if !child.matches(ctx)? {
						return Ok(false);
					}
				}
				Ok(true)
			}
			Self::Or(children) => {
				for child in children {
					if child.matches(ctx)? {
						return Ok(true);
					}
				}
				Ok(false)
			}
			Self::Not(child) => Ok(!child.matches(ctx)?),
			Self::Custom(custom) => custom.test(ctx),
		}
	}
}
