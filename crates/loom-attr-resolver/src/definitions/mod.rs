// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in attribute definitions.

mod mapped;
mod regex_split;
mod scoped;
mod template;

pub use mapped::{MappedDefinition, SourceValue, UnmappedValues, ValueMap};
pub use regex_split::RegexSplitDefinition;
pub use scoped::{PrescopedDefinition, ScopedDefinition};
pub use template::TemplateDefinition;

use loom_attr_core::AttributeValue;

use crate::error::DefinitionError;
use crate::node::{AttributeDefinition, DefinitionInput};

/// Passes its source values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleDefinition;

impl AttributeDefinition for SimpleDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		Ok(input.values.to_vec())
	}
}

/// Always yields the same values.
#[derive(Debug, Clone, Default)]
pub struct StaticDefinition {
	values: Vec<AttributeValue>,
}

impl StaticDefinition {
	pub fn new(values: impl IntoIterator<Item = AttributeValue>) -> Self {
		Self {
			values: values.into_iter().collect(),
		}
	}
}

impl AttributeDefinition for StaticDefinition {
	fn compute(&self, _input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		Ok(self.values.clone())
	}
}

/// Yields the request principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalNameDefinition;

impl AttributeDefinition for PrincipalNameDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		Ok(vec![AttributeValue::string(&input.request.principal)])
	}
}


#[cfg(test)]
mod tests {
	use super::test_support::Inputs;
	use super::*;

	#[test]
	fn simple_passes_values_through() {
		let inputs = Inputs::strings(&["a", "b"]);
		let out = SimpleDefinition.compute(&inputs.input()).unwrap();
		assert_eq!(out, vec![AttributeValue::string("a"), AttributeValue::string("b")]);
	}

	#[test]
	fn static_ignores_inputs() {
		let inputs = Inputs::strings(&["a"]);
		let def = StaticDefinition::new([AttributeValue::string("member")]);
		assert_eq!(def.compute(&inputs.input()).unwrap(), vec![AttributeValue::string("member")]);
	}

	#[test]
	fn principal_name_uses_request() {
		let inputs = Inputs::strings(&[]);
		let out = PrincipalNameDefinition.compute(&inputs.input()).unwrap();
		assert_eq!(out, vec![AttributeValue::string("alice")]);
	}
}
