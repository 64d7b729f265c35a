// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration assembled from one source.

use serde::Deserialize;

use crate::sections::{LoggingSettingsLayer, PairwiseSettingsLayer, ResolverSettingsLayer};

/// One source's view of the configuration. Unset sections are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfigLayer {
	#[serde(default)]
	pub resolver: Option<ResolverSettingsLayer>,
	#[serde(default)]
	pub pairwise: Option<PairwiseSettingsLayer>,
	#[serde(default)]
	pub logging: Option<LoggingSettingsLayer>,
}

impl EngineConfigLayer {
	/// Overlays `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: EngineConfigLayer) {
		merge_section(&mut self.resolver, other.resolver, ResolverSettingsLayer::merge);
		merge_section(&mut self.pairwise, other.pairwise, PairwiseSettingsLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingSettingsLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(b), Some(o)) => merge(b, o),
		(None, Some(o)) => *base = Some(o),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_overrides_field_by_field() {
		let mut base: EngineConfigLayer = toml::from_str(
			r#"
			[resolver]
			max_concurrent_fetches = 8
			fetch_timeout_ms = 1000

			[logging]
			level = "debug"
			"#,
		)
		.unwrap();

		let overlay: EngineConfigLayer = toml::from_str(
			r#"
			[resolver]
			fetch_timeout_ms = 250

			[pairwise]
			algorithm = "sha512"
			"#,
		)
		.unwrap();

		base.merge(overlay);

		let resolver = base.resolver.unwrap();
		assert_eq!(resolver.max_concurrent_fetches, Some(8));
		assert_eq!(resolver.fetch_timeout_ms, Some(250));
		assert!(base.pairwise.is_some());
		assert_eq!(base.logging.unwrap().level.as_deref(), Some("debug"));
	}

	mod merge_laws {
		use super::*;
		use crate::sections::{DigestAlgorithm, IdEncoding};
		use proptest::option;
		use proptest::prelude::*;

		fn resolver() -> impl Strategy<Value = Option<ResolverSettingsLayer>> {
			option::of((option::of(1usize..64), option::of(0u64..10_000)).prop_map(
				|(max_concurrent_fetches, fetch_timeout_ms)| ResolverSettingsLayer {
					max_concurrent_fetches,
					fetch_timeout_ms,
				},
			))
		}

		fn pairwise() -> impl Strategy<Value = Option<PairwiseSettingsLayer>> {
			option::of(
				(
					option::of("sqlite:[a-z]{1,8}\\.db"),
					option::of(prop_oneof![Just(DigestAlgorithm::Sha256), Just(DigestAlgorithm::Sha512)]),
					option::of(prop_oneof![Just(IdEncoding::Base64), Just(IdEncoding::Hex)]),
					option::of(1u32..10),
					option::of(0u64..1_000),
					option::of(0u64..5_000),
					option::of(any::<bool>()),
				)
					.prop_map(
						|(
							database_url,
							algorithm,
							encoding,
							max_attempts,
							base_delay_ms,
							max_delay_ms,
							fallback_to_computed,
						)| PairwiseSettingsLayer {
							database_url,
							algorithm,
							encoding,
							max_attempts,
							base_delay_ms,
							max_delay_ms,
							fallback_to_computed,
						},
					),
			)
		}

		fn logging() -> impl Strategy<Value = Option<LoggingSettingsLayer>> {
			option::of(
				(option::of("(info|debug|warn|loom_attr_resolver=trace)"), option::of(any::<bool>()))
					.prop_map(|(level, json)| LoggingSettingsLayer { level, json }),
			)
		}

		fn layer() -> impl Strategy<Value = EngineConfigLayer> {
			(resolver(), pairwise(), logging()).prop_map(|(resolver, pairwise, logging)| {
				EngineConfigLayer {
					resolver,
					pairwise,
					logging,
				}
			})
		}

		fn merged(mut base: EngineConfigLayer, overlay: EngineConfigLayer) -> EngineConfigLayer {
			base.merge(overlay);
			base
		}

		fn field<S, T: Clone>(section: &Option<S>, get: impl Fn(&S) -> &Option<T>) -> Option<T> {
			section.as_ref().and_then(|s| get(s).clone())
		}

		proptest! {
			#[test]
			fn merge_is_associative(a in layer(), b in layer(), c in layer()) {
				let left = merged(merged(a.clone(), b.clone()), c.clone());
				let right = merged(a, merged(b, c));
				prop_assert_eq!(left, right);
			}

			#[test]
			fn later_layer_overrides_set_fields(base in layer(), overlay in layer()) {
				let result = merged(base.clone(), overlay.clone());

				prop_assert_eq!(
					field(&result.resolver, |s| &s.fetch_timeout_ms),
					field(&overlay.resolver, |s| &s.fetch_timeout_ms)
						.or(field(&base.resolver, |s| &s.fetch_timeout_ms))
				);
				prop_assert_eq!(
					field(&result.resolver, |s| &s.max_concurrent_fetches),
					field(&overlay.resolver, |s| &s.max_concurrent_fetches)
						.or(field(&base.resolver, |s| &s.max_concurrent_fetches))
				);
				prop_assert_eq!(
					field(&result.pairwise, |s| &s.algorithm),
					field(&overlay.pairwise, |s| &s.algorithm)
						.or(field(&base.pairwise, |s| &s.algorithm))
				);
				prop_assert_eq!(
					field(&result.pairwise, |s| &s.max_attempts),
					field(&overlay.pairwise, |s| &s.max_attempts)
						.or(field(&base.pairwise, |s| &s.max_attempts))
				);
				prop_assert_eq!(
					field(&result.pairwise, |s| &s.database_url),
					field(&overlay.pairwise, |s| &s.database_url)
						.or(field(&base.pairwise, |s| &s.database_url))
				);
				prop_assert_eq!(
					field(&result.logging, |s| &s.level),
					field(&overlay.logging, |s| &s.level)
						.or(field(&base.logging, |s| &s.level))
				);
			}

			#[test]
			fn empty_layer_is_identity(a in layer()) {
				prop_assert_eq!(merged(a.clone(), EngineConfigLayer::default()), a.clone());
				prop_assert_eq!(merged(EngineConfigLayer::default(), a.clone()), a);
			}
		}
	}
}
