// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_attr_core::AttributeValue;
use regex::Regex;
use tracing::debug;

use crate::error::DefinitionError;
use crate::node::{AttributeDefinition, DefinitionInput};

/// Extracts the first capture group from values matching a pattern.
///
/// The pattern must match the whole value. Values that do not match are
/// dropped.
#[derive(Debug, Clone)]
pub struct RegexSplitDefinition {
	regex: Regex,
}

impl RegexSplitDefinition {
	pub fn new(pattern: &str) -> Result<Self, DefinitionError> {
		let regex = Regex::new(&format!("^(?:{pattern})$"))
			.map_err(|e| DefinitionError::InvalidConfig(format!("invalid pattern '{pattern}': {e}")))?;
		if regex.captures_len() < 2 {
			return Err(DefinitionError::InvalidConfig(format!(
				"pattern '{pattern}' has no capture group"
			)));
		}
		Ok(Self { regex })
	}
}

impl AttributeDefinition for RegexSplitDefinition {
	fn compute(&self, input: &DefinitionInput<'_>) -> Result<Vec<AttributeValue>, DefinitionError> {
		let mut out = Vec::new();
		for value in input.values {
			let Some(text) = value.as_str() else {
				continue;
			};
			match self.regex.captures(text).and_then(|caps| caps.get(1)) {
				Some(group) => out.push(AttributeValue::string(group.as_str())),
				None => debug!(definition = %input.id, "value did not match split pattern"),
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
	fn extracts_first_group() {
		let def = RegexSplitDefinition::new(r"([^@]+)@example\.org").unwrap();
		let inputs = Inputs::strings(&["alice@example.org", "bob@other.org"]);
		assert_eq!(
			def.compute(&inputs.input()).unwrap(),
			vec![AttributeValue::string("alice")]
		);
	}

	#[test]
	fn requires_capture_group() {
		assert!(RegexSplitDefinition::new("abc").is_err());
	}
}
