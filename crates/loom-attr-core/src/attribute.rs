// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attributes and their typed values.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Resolved or filtered attributes keyed by attribute id.
pub type AttributeMap = HashMap<String, Attribute>;

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
	String(String),
	Scoped { value: String, scope: String },
	Bytes(Vec<u8>),
	Empty,
}

impl AttributeValue {
	pub fn string(value: impl Into<String>) -> Self {
		Self::String(value.into())
	}

	pub fn scoped(value: impl Into<String>, scope: impl Into<String>) -> Self {
		Self::Scoped {
			value: value.into(),
			scope: scope.into(),
		}
	}

	/// String projection used by matchers, templates and logging.
	///
	/// Scoped values render as `value@scope`, byte values as standard base64.
	pub fn display_value(&self) -> String {
		match self {
			Self::String(s) => s.clone(),
			Self::Scoped { value, scope } => format!("{value}@{scope}"),
			Self::Bytes(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
			Self::Empty => String::new(),
		}
	}

	/// The unscoped part of the value, if the value has a string form.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			Self::Scoped { value, .. } => Some(value),
			Self::Bytes(_) | Self::Empty => None,
		}
	}

	/// The scope of a scoped value.
	pub fn scope(&self) -> Option<&str> {
		match self {
			Self::Scoped { scope, .. } => Some(scope),
			_ => None,
		}
	}
}

impl fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display_value())
	}
}

impl From<&str> for AttributeValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for AttributeValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

/// A named, multi-valued piece of identity data.
///
/// Values keep insertion order and are never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttributeRepr")]
pub struct Attribute {
	id: String,
	values: Vec<AttributeValue>,
}

#[derive(Deserialize)]
struct AttributeRepr {
	id: String,
	#[serde(default)]
	values: Vec<AttributeValue>,
}

impl From<AttributeRepr> for Attribute {
	fn from(repr: AttributeRepr) -> Self {
		Attribute::with_values(repr.id, repr.values)
	}
}

impl Attribute {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			values: Vec::new(),
		}
	}

	pub fn with_values(
		id: impl Into<String>,
		values: impl IntoIterator<Item = AttributeValue>,
	) -> Self {
		let mut attribute = Self::new(id);
		attribute.extend(values);
		attribute
	}

	/// Builds an attribute of plain string values.
	pub fn from_strings<S: Into<String>>(
		id: impl Into<String>,
		values: impl IntoIterator<Item = S>,
	) -> Self {
		Self::with_values(id, values.into_iter().map(|v| AttributeValue::String(v.into())))
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn values(&self) -> &[AttributeValue] {
		&self.values
	}

	pub fn into_values(self) -> Vec<AttributeValue> {
		self.values
	}

	/// Appends a value, returning false if it was already present.
	pub fn push(&mut self, value: AttributeValue) -> bool {
		if self.values.contains(&value) {
			return false;
		}
		self.values.push(value);
		true
	}

	pub fn extend(&mut self, values: impl IntoIterator<Item = AttributeValue>) {
		for value in values {
			self.push(value);
		}
	}

	pub fn retain(&mut self, f: impl FnMut(&AttributeValue) -> bool) {
		self.values.retain(f);
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn contains(&self, value: &AttributeValue) -> bool {
		self.values.contains(value)
	}

	pub fn display_values(&self) -> Vec<String> {
		self.values.iter().map(AttributeValue::display_value).collect()
	}

	/// Returns a copy of this attribute under a different id.
	pub fn renamed(&self, id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			values: self.values.clone(),
		}
	}
}
