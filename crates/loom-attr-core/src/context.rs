// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped context shared by resolution and filtering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Describes a single attribute request: the authenticated principal, the
/// relying party asking for data, and arbitrary request metadata.
///
/// Built once per inbound request and never shared across requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
	pub principal: String,
	/// Relying party (service provider) the attributes are released to.
	pub requester: Option<String>,
	/// Entity issuing the attributes.
	pub issuer: Option<String>,
	#[serde(default)]
	pub metadata: HashMap<String, serde_json::Value>,
}

impl RequestContext {
	pub fn new(principal: impl Into<String>) -> Self {
		Self {
			principal: principal.into(),
			..Default::default()
		}
	}

	pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
		self.requester = Some(requester.into());
		self
	}

	pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = Some(issuer.into());
		self
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}

	pub fn metadata(&self, key: &str) -> Option<&serde_json::Value> {
		self.metadata.get(key)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_sets_fields() {
		let ctx = RequestContext::new("alice")
			.with_requester("https://sp.example.org")
			.with_issuer("https://idp.example.org")
			.with_metadata("authn_method", serde_json::json!("mfa"));

		assert_eq!(ctx.principal, "alice");
		assert_eq!(ctx.requester.as_deref(), Some("https://sp.example.org"));
		assert_eq!(ctx.issuer.as_deref(), Some("https://idp.example.org"));
		assert_eq!(ctx.metadata("authn_method"), Some(&serde_json::json!("mfa")));
		assert!(ctx.metadata("missing").is_none());
	}
}
