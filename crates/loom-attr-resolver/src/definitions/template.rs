// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `${attribute}` template definition.

use loom_attr_core::AttributeValue;

use crate::error::DefinitionError;
use crate::node::{AttributeDefinition, DefinitionInput};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Text(String),
	Source(usize),
}

/// Renders a template once per value index of its source attributes.
///
/// All source attributes must carry the same number of values; the i-th
/// output value substitutes the i-th value of each source.
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
	sources: Vec<String>,
	segments: Vec<Segment>,
}

impl TemplateDefinition {
	pub fn new<I, S>(template: &str, source_attribute_ids: I) -> Result<Self, DefinitionError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let sources: Vec<String> = source_attribute_ids.into_iter().map(Into::into).collect();
		if sources.is_empty() {
			return Err(DefinitionError::InvalidConfig(
				"template needs at least one source attribute".to_string(),
			));
		}

		let mut segments = Vec::new();
		let mut rest = template;
		while let Some(start) = rest.find("${") {
			if start > 0 {
				segments.push(Segment::Text(rest[..start].to_string()));
			}
			let after = &rest[start + 2..];
			let end = after.find('}').ok_or_else(|| {
				DefinitionError::InvalidConfig(format!("unterminated placeholder in '{template}'"))
			})?;
			let name = &after[..end];
			let idx = sources.iter().position(|s| s == name).ok_or_else(|| {
				DefinitionError::InvalidConfig(format!("placeholder '{name}' is not a source attribute"))
			})?;
			segments.push(Segment::Source(idx));
			rest = &after[end + 1..];
		}
		if !rest.is_empty() {
			segments.push(Segment::Text(rest.to_string()));
		}

		Ok(Self { sources, segments })
	}
}

impl AttributeDefinition for TemplateDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		let columns: Vec<&[AttributeValue]> = self
			.sources
			.iter()
			.map(|id| input.attributes.get(id).map(|a| a.values()).unwrap_or(&[]))
			.collect();

		let rows = columns.first().map_or(0, |c| c.len());
		if columns.iter().any(|c| c.len() != rows) {
			let counts: Vec<String> = self
				.sources
				.iter()
				.zip(&columns)
				.map(|(id, c)| format!("{id}={}", c.len()))
				.collect();
			return Err(DefinitionError::Mismatch(counts.join(", ")));
		}

		let mut out = Vec::with_capacity(rows);
		for row in 0..rows {
			let mut rendered = String::new();
			for segment in &self.segments {
				match segment {
					Segment::Text(text) => rendered.push_str(text),
					Segment::Source(idx) => rendered.push_str(&columns[*idx][row].display_value()),
				}
			}
			out.push(AttributeValue::string(rendered));
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::definitions::test_support::Inputs;
	use loom_attr_core::Attribute;

	fn with(mut inputs: Inputs, id: &str, values: &[&str]) -> Inputs {
		inputs
			.attributes
			.insert(id.to_string(), Attribute::from_strings(id, values.iter().copied()));
		inputs
	}

	#[test]
	fn renders_row_per_value() {
		let def = TemplateDefinition::new("${givenName} ${sn}", ["givenName", "sn"]).unwrap();
		let inputs = with(Inputs::strings(&[]), "givenName", &["Alice", "Bob"]);
		let inputs = with(inputs, "sn", &["Smith", "Jones"]);
		assert_eq!(
			def.compute(&inputs.input()).unwrap(),
			vec![AttributeValue::string("Alice Smith"), AttributeValue::string("Bob Jones")]
		);
	}

	#[test]
	fn mismatched_counts_fail() {
		let def = TemplateDefinition::new("${a}-${b}", ["a", "b"]).unwrap();
		let inputs = with(with(Inputs::strings(&[]), "a", &["1", "2"]), "b", &["x"]);
		assert!(matches!(
			def.compute(&inputs.input()),
			Err(DefinitionError::Mismatch(_))
		));
	}

	#[test]
	fn missing_sources_yield_nothing() {
		let def = TemplateDefinition::new("uid=${uid}", ["uid"]).unwrap();
		let inputs = Inputs::strings(&[]);
		assert!(def.compute(&inputs.input()).unwrap().is_empty());
	}

	#[test]
	fn rejects_unknown_placeholder() {
		assert!(TemplateDefinition::new("${nope}", ["uid"]).is_err());
		assert!(TemplateDefinition::new("${uid", ["uid"]).is_err());
	}
}
