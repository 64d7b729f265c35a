// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Value matchers.
//!
//! A [`Matcher`] decides whether a single attribute value may be released.
//! Matchers are immutable once built and may be shared across requests.
//! Combinators short-circuit: `And` stops at the first non-match, `Or` at the
//! first match. An error from any child aborts evaluation of that value only;
//! the filter engine then treats the value as not matching.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use loom_attr_core::{AttributeMap, AttributeValue, RequestContext};
use regex::Regex;

use crate::error::{FilterError, Result};
use crate::string_match::StringMatch;

/// Default delimiter between local part and scope.
pub const DEFAULT_SCOPE_DELIMITER: char = '@';

/// Everything a matcher may look at besides the value under test.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
	pub request: &'a RequestContext,
	/// The complete resolved attribute set being filtered.
	pub attributes: &'a AttributeMap,
}

impl<'a> FilterContext<'a> {
	pub fn new(request: &'a RequestContext, attributes: &'a AttributeMap) -> Self {
		Self {
			request,
			attributes,
		}
	}
}

/// Externally supplied value predicate.
pub trait ValuePredicate: Send + Sync {
	fn test(&self, value: &AttributeValue, ctx: &FilterContext<'_>) -> Result<bool>;
}

impl<F> ValuePredicate for F
where
	F: Fn(&AttributeValue, &FilterContext<'_>) -> Result<bool> + Send + Sync,
{
	fn test(&self, value: &AttributeValue, ctx: &FilterContext<'_>) -> Result<bool> {
		self(value, ctx)
	}
}

/// A named custom value predicate.
#[derive(Clone)]
pub struct CustomMatcher {
	pub name: String,
	predicate: Arc<dyn ValuePredicate>,
}

impl CustomMatcher {
	pub fn new(name: impl Into<String>, predicate: impl ValuePredicate + 'static) -> Self {
		Self {
			name: name.into(),
			predicate: Arc::new(predicate),
		}
	}

	pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&AttributeValue, &FilterContext<'_>) -> Result<bool> + Send + Sync + 'static,
	{
		Self::new(name, f)
	}

	fn test(&self, value: &AttributeValue, ctx: &FilterContext<'_>) -> Result<bool> {
		catch_unwind(AssertUnwindSafe(|| self.predicate.test(value, ctx)))
			.unwrap_or_else(|_| Err(FilterError::matcher(&self.name, "predicate panicked")))
	}
}

impl fmt::Debug for CustomMatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomMatcher")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// A regular expression that must match the entire candidate.
#[derive(Debug, Clone)]
pub struct FullRegex {
	pattern: String,
	regex: Regex,
}

impl FullRegex {
	pub fn new(pattern: impl Into<String>) -> Result<Self> {
		let pattern = pattern.into();
		let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| FilterError::InvalidRegex {
			pattern: pattern.clone(),
			message: e.to_string(),
		})?;
		Ok(Self { pattern, regex })
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn is_match(&self, candidate: &str) -> bool {
		self.regex.is_match(candidate)
	}
}

/// A predicate over a single attribute value.
#[derive(Debug, Clone)]
pub enum Matcher {
	/// Matches every value.
	Any,
	/// Matches no value.
	None,
	/// Compares the unscoped string form of the value.
	String(StringMatch),
	/// Full-match regex over the unscoped string form of the value.
	Regex(FullRegex),
	/// Compares the scope of a scoped value.
	Scope(StringMatch),
	ScopeRegex(FullRegex),
	/// Splits the value into local part and scope and matches each.
	ScopedString {
		local: StringMatch,
		scope: StringMatch,
		delimiter: char,
	},
	And(Vec<Matcher>),
	Or(Vec<Matcher>),
	Not(Box<Matcher>),
	Custom(CustomMatcher),
}

impl Matcher {
	pub fn exact(value: impl Into<String>) -> Self {
		Self::String(StringMatch::exact(value))
	}

	pub fn case_insensitive(value: impl Into<String>) -> Self {
		Self::String(StringMatch::case_insensitive(value))
	}

	pub fn regex(pattern: impl Into<String>) -> Result<Self> {
		Ok(Self::Regex(FullRegex::new(pattern)?))
	}

	pub fn scope(scope: StringMatch) -> Self {
		Self::Scope(scope)
	}

	pub fn scope_regex(pattern: impl Into<String>) -> Result<Self> {
		Ok(Self::ScopeRegex(FullRegex::new(pattern)?))
	}

	pub fn scoped_string(local: StringMatch, scope: StringMatch) -> Self {
		Self::ScopedString {
			local,
			scope,
			delimiter: DEFAULT_SCOPE_DELIMITER,
		}
	}

	pub fn and(children: impl IntoIterator<Item = Matcher>) -> Self {
		Self::And(children.into_iter().collect())
	}

	pub fn or(children: impl IntoIterator<Item = Matcher>) -> Self {
		Self::Or(children.into_iter().collect())
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(child: Matcher) -> Self {
		Self::Not(Box::new(child))
	}

	pub fn custom<F>(name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&AttributeValue, &FilterContext<'_>) -> Result<bool> + Send + Sync + 'static,
	{
		Self::Custom(CustomMatcher::from_fn(name, f))
	}

	/// Evaluates this matcher against one value.
	pub fn matches(&self, value: &AttributeValue, ctx: &FilterContext<'_>) -> Result<bool> {
		match self {
			Self::Any => Ok(true),
			Self::None => Ok(false),
			Self::String(m) => Ok(value.as_str().is_some_and(|s| m.matches(s))),
			Self::Regex(re) => Ok(value.as_str().is_some_and(|s| re.is_match(s))),
			Self::Scope(m) => Ok(value.scope().is_some_and(|s| m.matches(s))),
			Self::ScopeRegex(re) => Ok(value.scope().is_some_and(|s| re.is_match(s))),
			Self::ScopedString {
				local,
				scope,
				delimiter,
			} => Ok(split_scoped(value, *delimiter)
				.is_some_and(|(l, s)| local.matches(l) && scope.matches(s))),
			Self::And(children) => {
				for child in children {
					if !child.matches(value, ctx)? {
						return Ok(false);
					}
				}
				Ok(true)
			}
			Self::Or(children) => {
				for child in children {
					if child.matches(value, ctx)? {
						return Ok(true);
					}
				}
				Ok(false)
			}
			Self::Not(child) => Ok(!child.matches(value, ctx)?),
			Self::Custom(custom) => custom.test(value, ctx),
		}
	}
}

/// Splits a value into (local part, scope).
///
/// Scoped values split structurally. String values split at the last
/// occurrence of `delimiter`; strings without it have no scope.
fn split_scoped(value: &AttributeValue, delimiter: char) -> Option<(&str, &str)> {
	match value {
		AttributeValue::Scoped { value, scope } => Some((value, scope)),
		AttributeValue::String(s) => s.rsplit_once(delimiter),
		AttributeValue::Bytes(_) | AttributeValue::Empty => None,
	}
}
