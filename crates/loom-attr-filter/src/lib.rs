// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute filtering for the Loom attribute engine.
//!
//! Given a resolved attribute set and the request it was resolved for, the
//! [`AttributeFilter`] decides value-by-value what may be disclosed.
//!
//! # Architecture
//!
//! - `string_match` - Literal comparison with one case-sensitivity flag
//! - `matcher` - Value matchers and their combinators
//! - `requirement` - Policy requirement rules over the request
//! - `policy` - Filter policies and attribute rules
//! - `engine` - The default-deny filter pass
//!
//! # Example
//!
//! ```
//! use loom_attr_core::{Attribute, AttributeMap, RequestContext};
//! use loom_attr_filter::{AttributeFilter, AttributeFilterPolicy, Matcher, PolicyRequirement};
//!
//! let filter = AttributeFilter::new(vec![
//!     AttributeFilterPolicy::new("release-uid", PolicyRequirement::requester("sp1"))
//!         .permit("uid", Matcher::exact("alice")),
//! ])
//! .unwrap();
//!
//! let mut resolved = AttributeMap::new();
//! resolved.insert("uid".into(), Attribute::from_strings("uid", ["alice", "bob"]));
//!
//! let released = filter.filter(resolved, &RequestContext::new("alice").with_requester("sp1"));
//! assert_eq!(released["uid"].display_values(), vec!["alice"]);
//! ```

pub mod engine;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod requirement;
pub mod string_match;

pub use engine::{AttributeFilter, FilterReport};
pub use error::{FilterError, Result};
pub use matcher::{
	CustomMatcher, FilterContext, FullRegex, Matcher, ValuePredicate, DEFAULT_SCOPE_DELIMITER,
};
pub use policy::{AttributeFilterPolicy, AttributeRule, RuleEffect};
pub use requirement::{CustomRequirement, PolicyRequirement};
pub use string_match::StringMatch;
