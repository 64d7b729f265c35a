// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod pairwise;
mod resolver;

pub use logging::{LoggingSettings, LoggingSettingsLayer};
pub use pairwise::{
	DigestAlgorithm, IdEncoding, PairwiseSettings, PairwiseSettingsLayer, Salt, MIN_SALT_LEN,
};
pub use resolver::{ResolverSettings, ResolverSettingsLayer};
