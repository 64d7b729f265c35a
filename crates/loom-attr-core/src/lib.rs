// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom attribute engine.
//!
//! This crate provides the types shared by the resolver (`loom-attr-resolver`)
//! and the filter (`loom-attr-filter`):
//!
//! - [`Attribute`] and [`AttributeValue`]: named, multi-valued identity data
//! - [`RequestContext`]: who is asking about whom, plus request-scoped metadata
//!
//! # Example
//!
//! ```
//! use loom_attr_core::{Attribute, AttributeValue, RequestContext};
//!
//! let ctx = RequestContext::new("alice")
//!     .with_requester("https://sp.example.org/shibboleth");
//!
//! let mut mail = Attribute::new("mail");
//! mail.push(AttributeValue::string("alice@example.org"));
//!
//! assert_eq!(mail.display_values(), vec!["alice@example.org".to_string()]);
//! assert_eq!(ctx.principal, "alice");
//! ```

pub mod attribute;
pub mod context;

pub use attribute::{Attribute, AttributeMap, AttributeValue};
pub use context::RequestContext;
