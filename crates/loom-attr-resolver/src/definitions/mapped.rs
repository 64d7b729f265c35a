// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Value mapping definition.

use loom_attr_core::AttributeValue;
use regex::Regex;

use crate::error::DefinitionError;
use crate::node::{AttributeDefinition, DefinitionInput};

/// One way of recognising an input value.
#[derive(Debug, Clone)]
pub enum SourceValue {
	Literal { value: String, ignore_case: bool },
	/// Regex sources may feed capture groups into the return value as `$1`.
	/// Whole-value patterns are stored already anchored.
	Pattern(Regex),
}

impl SourceValue {
	pub fn literal(value: impl Into<String>) -> Self {
		SourceValue::Literal {
			value: value.into(),
			ignore_case: false,
		}
	}

	pub fn literal_ignore_case(value: impl Into<String>) -> Self {
		SourceValue::Literal {
			value: value.into(),
			ignore_case: true,
		}
	}

	/// A pattern that must match the whole value.
	pub fn pattern(pattern: &str) -> Result<Self, DefinitionError> {
		Self::compile(pattern, false)
	}

	/// A pattern that may match anywhere in the value.
	pub fn partial_pattern(pattern: &str) -> Result<Self, DefinitionError> {
		Self::compile(pattern, true)
	}

	fn compile(pattern: &str, partial_match: bool) -> Result<Self, DefinitionError> {
		let anchored = if partial_match {
			pattern.to_string()
		} else {
			format!("^(?:{pattern})$")
		};
		let regex = Regex::new(&anchored)
			.map_err(|e| DefinitionError::InvalidConfig(format!("invalid pattern '{pattern}': {e}")))?;
		Ok(SourceValue::Pattern(regex))
	}

	fn map(&self, input: &str, return_value: &str) -> Option<String> {
		match self {
			SourceValue::Literal { value, ignore_case } => {
				let hit = if *ignore_case {
					value.to_lowercase() == input.to_lowercase()
				} else {
					value == input
				};
				hit.then(|| return_value.to_string())
			}
			SourceValue::Pattern(regex) => regex.captures(input).map(|caps| {
				let mut out = String::new();
				caps.expand(return_value, &mut out);
				out
			}),
		}
	}
}

/// Maps any of `source_values` to `return_value`.
#[derive(Debug, Clone)]
pub struct ValueMap {
	pub return_value: String,
	pub source_values: Vec<SourceValue>,
}

impl ValueMap {
	pub fn new(return_value: impl Into<String>, source_values: Vec<SourceValue>) -> Self {
		Self {
			return_value: return_value.into(),
			source_values,
		}
	}
}

/// What to do with an input value that no map recognises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnmappedValues {
	#[default]
	Drop,
	Default(String),
	PassThrough,
}

/// Translates input values through a set of value maps.
///
/// Each input value is tested against every map; all matching maps
/// contribute their return value.
#[derive(Debug, Clone)]
pub struct MappedDefinition {
	maps: Vec<ValueMap>,
	unmapped: UnmappedValues,
}

impl MappedDefinition {
	pub fn new(maps: Vec<ValueMap>) -> Self {
		Self {
			maps,
			unmapped: UnmappedValues::Drop,
		}
	}

	pub fn with_default(mut self, value: impl Into<String>) -> Self {
		self.unmapped = UnmappedValues::Default(value.into());
		self
	}

	pub fn pass_through(mut self) -> Self {
		self.unmapped = UnmappedValues::PassThrough;
		self
	}
}

impl AttributeDefinition for MappedDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		let mut out: Vec<AttributeValue> = Vec::new();
		let mut push = |value: AttributeValue| {
			if !out.contains(&value) {
				out.push(value);
			}
		};

		for value in input.values {
			let text = value.display_value();
			let mut mapped = false;
			for map in &self.maps {
				if let Some(result) = map
					.source_values
					.iter()
					.find_map(|source| source.map(&text, &map.return_value))
				{
					push(AttributeValue::string(result));
					mapped = true;
				}
			}

			if !mapped {
				match &self.unmapped {
					UnmappedValues::Drop => {}
					UnmappedValues::Default(default) => push(AttributeValue::string(default)),
					UnmappedValues::PassThrough => push(value.clone()),
				}
			}
		}

		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::definitions::test_support::Inputs;

	fn affiliation() -> MappedDefinition {
		MappedDefinition::new(vec![
			ValueMap::new(
				"staff",
				vec![SourceValue::literal("employee"), SourceValue::literal_ignore_case("FACULTY")],
			),
			ValueMap::new("student", vec![SourceValue::pattern("undergrad|grad").unwrap()]),
		])
	}

	#[test]
	fn maps_literals_and_patterns() {
		let inputs = Inputs::strings(&["employee", "faculty", "grad"]);
		let out = affiliation().compute(&inputs.input()).unwrap();
		assert_eq!(
			out,
			vec![AttributeValue::string("staff"), AttributeValue::string("student")]
		);
	}

	#[test]
	fn unmapped_values_drop_by_default() {
		let inputs = Inputs::strings(&["visitor"]);
		assert!(affiliation().compute(&inputs.input()).unwrap().is_empty());
	}

	#[test]
	fn unmapped_values_use_default() {
		let inputs = Inputs::strings(&["visitor"]);
		let out = affiliation().with_default("affiliate").compute(&inputs.input()).unwrap();
		assert_eq!(out, vec![AttributeValue::string("affiliate")]);
	}

	#[test]
	fn unmapped_values_pass_through() {
		let inputs = Inputs::strings(&["visitor", "employee"]);
		let out = affiliation().pass_through().compute(&inputs.input()).unwrap();
		assert_eq!(
			out,
			vec![AttributeValue::string("visitor"), AttributeValue::string("staff")]
		);
	}

	#[test]
	fn pattern_is_anchored_unless_partial() {
		let inputs = Inputs::strings(&["postgrad"]);
		assert!(affiliation().compute(&inputs.input()).unwrap().is_empty());

		let partial = MappedDefinition::new(vec![ValueMap::new(
			"student",
			vec![SourceValue::partial_pattern("grad").unwrap()],
		)]);
		assert_eq!(
			partial.compute(&inputs.input()).unwrap(),
			vec![AttributeValue::string("student")]
		);
	}

	#[test]
	fn return_value_expands_captures() {
		let def = MappedDefinition::new(vec![ValueMap::new(
			"group:$1",
			vec![SourceValue::pattern(r"cn=(\w+),ou=groups").unwrap()],
		)]);
		let inputs = Inputs::strings(&["cn=admins,ou=groups"]);
		assert_eq!(
			def.compute(&inputs.input()).unwrap(),
			vec![AttributeValue::string("group:admins")]
		);
	}

	#[test]
	fn invalid_pattern_is_rejected() {
		assert!(matches!(SourceValue::pattern("("), Err(DefinitionError::InvalidConfig(_))));
	}
}
