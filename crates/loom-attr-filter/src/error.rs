// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterError {
	#[error("invalid regular expression '{pattern}': {message}")]
	InvalidRegex { pattern: String, message: String },

	#[error("duplicate filter policy id: {0}")]
	DuplicatePolicy(String),

	#[error("matcher '{matcher}' failed: {message}")]
	Matcher { matcher: String, message: String },
}

impl FilterError {
	pub fn matcher(matcher: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Matcher {
			matcher: matcher.into(),
			message: message.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, FilterError>;
