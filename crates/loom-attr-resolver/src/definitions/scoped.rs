// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_attr_core::AttributeValue;
use tracing::debug;

use crate::error::DefinitionError;
use crate::node::{AttributeDefinition, DefinitionInput};

/// Attaches a fixed scope to each string value.
#[derive(Debug, Clone)]
pub struct ScopedDefinition {
	scope: String,
}

impl ScopedDefinition {
	pub fn new(scope: impl Into<String>) -> Self {
		Self {
			scope: scope.into(),
		}
	}
}

impl AttributeDefinition for ScopedDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		let mut out = Vec::with_capacity(input.values.len());
		for value in input.values {
			match value.as_str() {
				Some(s) => out.push(AttributeValue::scoped(s, &self.scope)),
				None => debug!(definition = %input.id, "skipping non-string value"),
			}
		}
		Ok(out)
	}
}

/// Splits `value<delimiter>scope` strings into scoped values.
///
/// Values that are already scoped pass through. A string without the
/// delimiter fails the definition.
#[derive(Debug, Clone)]
pub struct PrescopedDefinition {
	delimiter: char,
}

impl PrescopedDefinition {
	pub fn new(delimiter: char) -> Self {
		Self { delimiter }
	}
}

impl Default for PrescopedDefinition {
	fn default() -> Self {
		Self::new('@')
	}
}

impl AttributeDefinition for PrescopedDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		let mut out = Vec::with_capacity(input.values.len());
		for value in input.values {
			match value {
				AttributeValue::Scoped { .. } => out.push(value.clone()),
				AttributeValue::String(s) => match s.split_once(self.delimiter) {
					Some((local, scope)) if !local.is_empty() && !scope.is_empty() => {
						out.push(AttributeValue::scoped(local, scope))
					}
					_ => {
						return Err(DefinitionError::InvalidValue {
							value: s.clone(),
							reason: format!("expected value{}scope", self.delimiter),
						})
					}
				},
				_ => debug!(definition = %input.id, "skipping non-string value"),
			}
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::definitions::test_support::Inputs;

	#[test]
	fn scoped_attaches_scope() {
		let inputs = Inputs::strings(&["staff", "member"]);
		let out = ScopedDefinition::new("example.org").compute(&inputs.input()).unwrap();
		assert_eq!(
			out,
			vec![
				AttributeValue::scoped("staff", "example.org"),
				AttributeValue::scoped("member", "example.org"),
			]
		);
	}

	#[test]
	fn prescoped_splits_on_first_delimiter() {
		let inputs = Inputs::strings(&["staff@example.org"]);
		let out = PrescopedDefinition::default().compute(&inputs.input()).unwrap();
		assert_eq!(out, vec![AttributeValue::scoped("staff", "example.org")]);
	}

	#[test]
	fn prescoped_rejects_unscoped_value() {
		let inputs = Inputs::strings(&["staff"]);
		let err = PrescopedDefinition::default().compute(&inputs.input()).unwrap_err();
		assert!(matches!(err, DefinitionError::InvalidValue { ref value, .. } if value == "staff"));
	}

	#[test]
	fn prescoped_custom_delimiter() {
		let inputs = Inputs::strings(&["staff#example.org"]);
		let out = PrescopedDefinition::new('#').compute(&inputs.input()).unwrap();
		assert_eq!(out, vec![AttributeValue::scoped("staff", "example.org")]);
	}
}
