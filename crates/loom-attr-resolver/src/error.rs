// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for graph construction, resolution and the pairwise store.

use std::time::Duration;

use thiserror::Error;

/// Rejections raised while building a [`crate::ResolverGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	#[error("duplicate node id '{0}'")]
	DuplicateId(String),

	#[error("node '{node}' depends on unknown node '{dependency}'")]
	UnknownDependency { node: String, dependency: String },

	#[error("connector '{node}' names unknown failover '{failover}'")]
	UnknownFailover { node: String, failover: String },

	#[error("connector '{node}' names failover '{failover}' which is not a data connector")]
	FailoverNotConnector { node: String, failover: String },

	#[error("dependency cycle: {}", path.join(" -> "))]
	Cycle { path: Vec<String> },
}

/// Classification of pairwise store failures, used to decide retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
	/// The store could not be reached.
	Connectivity,
	/// The store was reachable but a lock could not be acquired in time.
	LockTimeout,
	/// A uniqueness constraint rejected the write.
	Duplicate,
	Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} store error: {message}")]
pub struct StoreError {
	pub kind: StoreErrorKind,
	pub message: String,
}

impl StoreError {
	pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn connectivity(message: impl Into<String>) -> Self {
		Self::new(StoreErrorKind::Connectivity, message)
	}

	pub fn lock_timeout(message: impl Into<String>) -> Self {
		Self::new(StoreErrorKind::LockTimeout, message)
	}

	pub fn duplicate(message: impl Into<String>) -> Self {
		Self::new(StoreErrorKind::Duplicate, message)
	}

	pub fn fatal(message: impl Into<String>) -> Self {
		Self::new(StoreErrorKind::Fatal, message)
	}

	pub fn is_duplicate(&self) -> bool {
		self.kind == StoreErrorKind::Duplicate
	}
}

// SQLite primary result codes for SQLITE_BUSY and SQLITE_LOCKED, plus the
// extended codes derived from them.
const SQLITE_LOCK_CODES: &[&str] = &["5", "6", "261", "262", "517", "518", "773"];

fn is_sqlite_lock_code(code: &str) -> bool {
	SQLITE_LOCK_CODES.contains(&code)
}

impl From<sqlx::Error> for StoreError {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				StoreError::duplicate(db_err.message().to_string())
			}
			sqlx::Error::Database(ref db_err)
				if db_err
					.code()
					.is_some_and(|code| is_sqlite_lock_code(&code)) =>
			{
				StoreError::lock_timeout(db_err.message().to_string())
			}
			sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
				StoreError::connectivity(err.to_string())
			}
			other => StoreError::fatal(other.to_string()),
		}
	}
}

/// Failure reported by a data connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
	#[error("backend error: {0}")]
	Backend(String),

	#[error("fetch timed out after {0:?}")]
	Timeout(Duration),

	#[error("missing input: {0}")]
	MissingInput(String),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("pairwise store: {0}")]
	Store(#[from] StoreError),
}

impl ConnectorError {
	pub fn backend(message: impl Into<String>) -> Self {
		Self::Backend(message.into())
	}
}

/// Failure reported by an attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("unusable input value '{value}': {reason}")]
	InvalidValue { value: String, reason: String },

	#[error("source attributes have mismatched value counts: {0}")]
	Mismatch(String),
}

/// Fatal outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
	#[error("connector '{node}' failed: {source}")]
	Connector {
		node: String,
		#[source]
		source: ConnectorError,
	},

	#[error("definition '{node}' failed: {source}")]
	Definition {
		node: String,
		#[source]
		source: DefinitionError,
	},

	#[error("unknown node '{0}'")]
	UnknownNode(String),
}

impl ResolutionError {
	pub fn connector(node: impl Into<String>, source: ConnectorError) -> Self {
		Self::Connector {
			node: node.into(),
			source,
		}
	}

	pub fn definition(node: impl Into<String>, source: DefinitionError) -> Self {
		Self::Definition {
			node: node.into(),
			source,
		}
	}
}

pub type Result<T, E = ResolutionError> = std::result::Result<T, E>;
