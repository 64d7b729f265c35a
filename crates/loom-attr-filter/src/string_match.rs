// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Literal string comparison with a single case-sensitivity flag.

use serde::{Deserialize, Serialize};

/// A literal string to compare candidate values against.
///
/// Case sensitivity is held in one canonical field. The legacy inverse
/// `ignore_case` form is exposed only through accessors, and is accepted on
/// deserialization as an alias for the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StringMatchRepr")]
pub struct StringMatch {
	pub value: String,
	pub case_sensitive: bool,
}

impl StringMatch {
	/// Case-sensitive match.
	pub fn exact(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			case_sensitive: true,
		}
	}

	pub fn case_insensitive(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			case_sensitive: false,
		}
	}

	/// Legacy inverse of [`Self::case_sensitive`].
	pub fn ignore_case(&self) -> bool {
		!self.case_sensitive
	}

	pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
		self.set_ignore_case(ignore_case);
		self
	}

	pub fn set_ignore_case(&mut self, ignore_case: bool) {
		self.case_sensitive = !ignore_case;
	}

	pub fn matches(&self, candidate: &str) -> bool {
		if self.case_sensitive {
			candidate == self.value
		} else {
			candidate.to_lowercase() == self.value.to_lowercase()
		}
	}
}

#[derive(Deserialize)]
struct StringMatchRepr {
	value: String,
	#[serde(default)]
	case_sensitive: Option<bool>,
	#[serde(default)]
	ignore_case: Option<bool>,
}

impl TryFrom<StringMatchRepr> for StringMatch {
	type Error = String;

	fn try_from(repr: StringMatchRepr) -> Result<Self, Self::Error> {
		let case_sensitive = match (repr.case_sensitive, repr.ignore_case) {
			(Some(cs), Some(ic)) if cs == ic => {
				return Err(format!(
					"conflicting case_sensitive={cs} and ignore_case={ic} for '{}'",
					repr.value
				));
			}
			(Some(cs), _) => cs,
			(None, Some(ic)) => !ic,
			(None, None) => true,
		};

		Ok(Self {
			value: repr.value,
			case_sensitive,
		})
	}
}
