//! Semantic-equality walker.
//!
//! Pairs the nodes of a prior and a proposed value tree, asks the
//! [`semeq_rules::RuleRegistry`] for each node's custom rule, and assembles a
//! merged tree in which every node keeps whichever representation its own
//! comparison resolved to. All findings come back as path-tagged
//! diagnostics; a failing node never stops its siblings from being compared.
//!
//! # Quick Start
//!
//! ```rust
//! use semeq_rules::RuleRegistry;
//! use semeq_types::TypedValue;
//! use semeq_walk::Walker;
//!
//! let registry = RuleRegistry::new();
//! let prior = TypedValue::object([("a", TypedValue::bool(true)), ("b", TypedValue::string("X"))]);
//! let proposed = TypedValue::object([("a", TypedValue::bool(true)), ("b", TypedValue::string("Y"))]);
//!
//! let outcome = Walker::new(&registry).walk(&prior, &proposed).unwrap();
//! assert!(outcome.changed());
//! assert_eq!(outcome.merged.get("b"), Some(&TypedValue::string("Y")));
//! ```

pub mod config;
pub mod error;
pub mod outcome;
mod policy;
pub mod walker;

pub use config::WalkConfig;
pub use error::{WalkError, WalkResult};
pub use outcome::{NodeState, WalkOutcome, WalkStats};
pub use walker::Walker;

#[cfg(test)]
mod tests {
    use super::*;
    use semeq_rules::{
        CancelReason, CancelToken, CaseInsensitiveString, EqualityResponse, FnRule,
        NumericString, RuleError, RuleRegistry,
    };
    use proptest::prelude::*;
    use semeq_types::{AttributePath, Diagnostic, Severity, TypeFamily, TypeId, TypedValue};

    fn strings(items: &[&str]) -> Vec<TypedValue> {
        items.iter().map(|s| TypedValue::string(*s)).collect()
    }

    fn ints(items: &[i64]) -> Vec<TypedValue> {
        items.iter().map(|i| TypedValue::int(*i)).collect()
    }

    fn ci() -> TypeId {
        TypeId::custom(TypeFamily::String, "ci_string")
    }

    fn ci_string(s: &str) -> TypedValue {
        TypedValue::string(s).with_type(ci()).unwrap()
    }

    fn ci_registry() -> RuleRegistry {
        RuleRegistry::new().with_rule(ci(), CaseInsensitiveString).unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    fn walk(registry: &RuleRegistry, prior: &TypedValue, proposed: &TypedValue) -> WalkOutcome {
        Walker::new(registry).walk(prior, proposed).unwrap()
    }

    // -----------------------------------------------------------------------
    // 1. Scalars without rules use raw equality
    // -----------------------------------------------------------------------
    #[test]
    fn bool_identical_keeps_prior_without_diagnostics() {
        let registry = RuleRegistry::new();
        let out = walk(&registry, &TypedValue::bool(true), &TypedValue::bool(true));
        assert!(out.keep_prior);
        assert_eq!(out.merged, TypedValue::bool(true));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn scalar_fallback_is_exact_raw_equality() {
        let registry = RuleRegistry::new();
        let cases = [
            (TypedValue::int(1), TypedValue::int(1), true),
            (TypedValue::int(1), TypedValue::int(2), false),
            (TypedValue::string("a"), TypedValue::string("A"), false),
            (TypedValue::float(1.5), TypedValue::float(1.5), true),
            (TypedValue::float(1.5), TypedValue::float(1.5000001), false),
        ];
        for (prior, proposed, expected) in cases {
            let out = walk(&registry, &prior, &proposed);
            assert_eq!(out.keep_prior, expected, "{prior:?} vs {proposed:?}");
            assert_eq!(out.merged, if expected { prior } else { proposed });
            assert_eq!(out.stats.rule_invocations, 0);
        }
    }

    #[test]
    fn non_finite_floats_keep_prior_in_every_container() {
        let registry = RuleRegistry::new();
        for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let leaf = TypedValue::float(x);
            let cases = [
                leaf.clone(),
                TypedValue::sequence(vec![leaf.clone()]),
                TypedValue::set(vec![leaf.clone()]),
                TypedValue::map([("k", leaf.clone())]),
            ];
            for value in cases {
                let out = walk(&registry, &value, &value.clone());
                assert!(out.keep_prior, "{value:?}");
                assert!(out.diagnostics.is_empty());
            }
        }
        assert!(!walk(&registry, &TypedValue::float(f64::NAN), &TypedValue::float(1.0)).keep_prior);
    }

    // -----------------------------------------------------------------------
    // 2. Type mismatch short-circuits
    // -----------------------------------------------------------------------
    #[test]
    fn type_mismatch_takes_proposed_without_rule_call() {
        let registry = ci_registry();
        let prior = ci_string("ABC");
        let proposed = TypedValue::string("abc");
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, proposed);
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.stats.rule_invocations, 0);
        assert_eq!(out.stats.type_mismatches, 1);
    }

    // -----------------------------------------------------------------------
    // 3. Null and unknown
    // -----------------------------------------------------------------------
    #[test]
    fn unknown_only_equals_unknown() {
        let registry = ci_registry();
        let unknown = TypedValue::unknown(ci());
        let null = TypedValue::null(ci());
        let known = ci_string("x");

        assert!(walk(&registry, &unknown, &unknown).keep_prior);
        assert!(!walk(&registry, &unknown, &known).keep_prior);
        assert!(!walk(&registry, &known, &unknown).keep_prior);
        assert!(!walk(&registry, &null, &unknown).keep_prior);
        assert!(walk(&registry, &null, &null).keep_prior);

        let out = walk(&registry, &known, &unknown);
        assert_eq!(out.merged, unknown);
        assert_eq!(out.stats.rule_invocations, 0);
    }

    // -----------------------------------------------------------------------
    // 4. Custom scalar rules
    // -----------------------------------------------------------------------
    #[test]
    fn custom_rule_keeps_prior_representation() {
        let registry = ci_registry();
        let out = walk(&registry, &ci_string("GRA7"), &ci_string("gra7"));
        assert!(out.keep_prior);
        assert_eq!(out.merged, ci_string("GRA7"));
        assert_eq!(out.stats.rule_invocations, 1);
    }

    #[test]
    fn raw_equal_values_skip_the_rule() {
        let registry = ci_registry();
        let out = walk(&registry, &ci_string("gra7"), &ci_string("gra7"));
        assert!(out.keep_prior);
        assert_eq!(out.stats.rule_invocations, 0);
    }

    #[test]
    fn error_diagnostic_overrides_keep_prior() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("always_errors", &[TypeFamily::String], |_| {
                    Ok(EqualityResponse::keep_prior()
                        .with_diagnostic(Diagnostic::error("lookup failed", "backend unavailable")))
                }),
            )
            .unwrap();
        let prior = TypedValue::object([("name", ci_string("X"))]);
        let proposed = TypedValue::object([("name", ci_string("x"))]);

        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged.get("name"), Some(&ci_string("x")));

        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, AttributePath::root().attribute("name"));
        assert_eq!(errors[0].summary, "lookup failed");
    }

    #[test]
    fn warning_does_not_override_verdict() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("warns", &[TypeFamily::String], |_| {
                    Ok(EqualityResponse::keep_prior().with_diagnostic(Diagnostic::warning("w", "")))
                }),
            )
            .unwrap();
        let out = walk(&registry, &ci_string("a"), &ci_string("b"));
        assert!(out.keep_prior);
        assert_eq!(out.diagnostics.count(Severity::Warning), 1);
    }

    #[test]
    fn rule_error_becomes_error_diagnostic() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("fails", &[TypeFamily::String], |_| {
                    Err(RuleError::failed("fails", "cannot parse"))
                }),
            )
            .unwrap();
        let out = walk(&registry, &ci_string("a"), &ci_string("b"));
        assert!(!out.keep_prior);
        assert_eq!(out.merged, ci_string("b"));
        assert_eq!(out.diagnostics.count(Severity::Error), 1);
        assert_eq!(out.stats.rule_failures, 1);
    }

    #[test]
    fn panicking_rule_is_isolated_to_its_node() {
        let broken = TypeId::custom(TypeFamily::String, "broken");
        let registry = RuleRegistry::new()
            .with_rule(
                broken.clone(),
                FnRule::new("panics", &[TypeFamily::String], |_| panic!("rule exploded")),
            )
            .unwrap()
            .with_rule(ci(), CaseInsensitiveString)
            .unwrap();

        let prior = TypedValue::object([
            ("bad", TypedValue::string("a").with_type(broken.clone()).unwrap()),
            ("good", ci_string("HOST")),
        ]);
        let proposed = TypedValue::object([
            ("bad", TypedValue::string("b").with_type(broken.clone()).unwrap()),
            ("good", ci_string("host")),
        ]);

        let out = walk(&registry, &prior, &proposed);
        assert_eq!(out.merged.get("good"), Some(&ci_string("HOST")));
        assert_eq!(out.merged.get("bad"), proposed.get("bad"));

        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, AttributePath::root().attribute("bad"));
        assert!(errors[0].detail.contains("rule exploded"));
        assert_eq!(out.stats.rule_failures, 1);
    }

    #[test]
    fn traced_config_brackets_rule_calls() {
        let registry = ci_registry();
        let out = Walker::new(&registry)
            .with_config(WalkConfig::traced())
            .walk(&ci_string("A"), &ci_string("a"))
            .unwrap();
        assert!(out.keep_prior);
        let traces: Vec<_> = out.diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            traces,
            vec![
                "Calling provider defined type-based semantic equality",
                "Called provider defined type-based semantic equality",
            ]
        );
        assert!(out.diagnostics.iter().all(|d| d.severity == Severity::Trace));
    }

    #[test]
    fn rule_diagnostics_are_tagged_with_node_path() {
        let amount = TypeId::custom(TypeFamily::String, "amount");
        let registry = RuleRegistry::new().with_rule(amount.clone(), NumericString).unwrap();
        let prior = TypedValue::map([("price", TypedValue::string("abc").with_type(amount.clone()).unwrap())]);
        let proposed = TypedValue::map([("price", TypedValue::string("1.0").with_type(amount).unwrap())]);

        let out = walk(&registry, &prior, &proposed);
        let warning = out.diagnostics.warnings().next().unwrap();
        assert_eq!(warning.path, AttributePath::root().key("price"));
    }

    // -----------------------------------------------------------------------
    // 5. Sequences
    // -----------------------------------------------------------------------
    #[test]
    fn sequence_length_mismatch_takes_proposed() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::sequence(ints(&[1, 2, 3]));
        let proposed = TypedValue::sequence(ints(&[1, 2]));
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, proposed);
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.stats.nodes_visited, 1);
    }

    #[test]
    fn sequence_element_change_composes_merged_value() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::sequence(ints(&[1, 2, 3]));
        let proposed = TypedValue::sequence(ints(&[1, 2, 4]));
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, TypedValue::sequence(ints(&[1, 2, 4])));
    }

    #[test]
    fn sequence_of_objects_keeps_unchanged_elements() {
        let registry = ci_registry();
        let obj = |name: &str, size: i64| {
            TypedValue::object([("name", ci_string(name)), ("size", TypedValue::int(size))])
        };
        let prior = TypedValue::sequence(vec![obj("A", 1), obj("B", 2)]);
        let proposed = TypedValue::sequence(vec![obj("a", 1), obj("b", 3)]);

        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        let merged = out.merged.elements().unwrap();
        assert_eq!(merged[0], obj("A", 1));
        // Second element: name still semantically equal, size changed.
        assert_eq!(merged[1].get("name"), Some(&ci_string("B")));
        assert_eq!(merged[1].get("size"), Some(&TypedValue::int(3)));
    }

    // -----------------------------------------------------------------------
    // 6. Maps
    // -----------------------------------------------------------------------
    #[test]
    fn map_with_different_keys_takes_proposed() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::map([("a", TypedValue::int(1))]);
        let proposed = TypedValue::map([("b", TypedValue::int(1))]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, proposed);
    }

    #[test]
    fn map_values_resolve_per_key() {
        let registry = ci_registry();
        let prior = TypedValue::map([("x", ci_string("ONE")), ("y", ci_string("two"))]);
        let proposed = TypedValue::map([("x", ci_string("one")), ("y", ci_string("three"))]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged.get("x"), Some(&ci_string("ONE")));
        assert_eq!(out.merged.get("y"), Some(&ci_string("three")));
    }

    #[test]
    fn map_semantically_equal_keeps_prior() {
        let registry = ci_registry();
        let prior = TypedValue::map([("x", ci_string("ONE"))]);
        let proposed = TypedValue::map([("x", ci_string("one"))]);
        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        assert_eq!(out.merged, prior);
    }

    // -----------------------------------------------------------------------
    // 7. Objects
    // -----------------------------------------------------------------------
    #[test]
    fn object_attributes_resolve_independently() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::object([("a", TypedValue::bool(true)), ("b", TypedValue::string("X"))]);
        let proposed = TypedValue::object([("a", TypedValue::bool(true)), ("b", TypedValue::string("Y"))]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged.get("a"), Some(&TypedValue::bool(true)));
        assert_eq!(out.merged.get("b"), Some(&TypedValue::string("Y")));
    }

    #[test]
    fn object_attribute_missing_from_prior_uses_proposed_shape() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::object([("a", TypedValue::int(1))]);
        let proposed = TypedValue::object([("a", TypedValue::int(1)), ("b", TypedValue::int(2))]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, proposed);
    }

    // -----------------------------------------------------------------------
    // 8. Sets
    // -----------------------------------------------------------------------
    #[test]
    fn set_reordered_members_keep_prior() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::set(strings(&["a", "b"]));
        let proposed = TypedValue::set(strings(&["b", "a"]));
        let first = walk(&registry, &prior, &proposed);
        let second = walk(&registry, &prior, &proposed);
        assert!(first.keep_prior);
        assert_eq!(first.merged.elements(), second.merged.elements());
        assert_eq!(first.merged.elements().unwrap(), strings(&["a", "b"]).as_slice());
        assert_eq!(first.stats.set_candidates_compared, 0);
    }

    #[test]
    fn set_unmatched_members_take_proposed_membership() {
        let registry = RuleRegistry::new();
        let prior = TypedValue::set(strings(&["a", "b"]));
        let proposed = TypedValue::set(strings(&["a", "c"]));
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, TypedValue::set(strings(&["a", "c"])));
    }

    #[test]
    fn set_semantic_matching_keeps_prior_representation() {
        let registry = ci_registry();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("b")]);
        let proposed = TypedValue::set(vec![ci_string("a"), ci_string("B")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        assert_eq!(out.merged, prior);
    }

    #[test]
    fn set_partial_semantic_match_keeps_matched_representation() {
        let registry = ci_registry();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("x")]);
        let proposed = TypedValue::set(vec![ci_string("a"), ci_string("y")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, TypedValue::set(vec![ci_string("A"), ci_string("y")]));
    }

    #[test]
    fn set_matching_prefers_raw_identity_over_semantic_equality() {
        let registry = ci_registry();
        // "a" could pair with either "A" or "a"; raw pairing must win.
        let prior = TypedValue::set(vec![ci_string("a")]);
        let proposed = TypedValue::set(vec![ci_string("A"), ci_string("a")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.stats.rule_invocations, 0);
        assert_eq!(out.merged, proposed);
    }

    #[test]
    fn set_matching_finds_maximum_pairing() {
        // Two-char priors match any one- or two-char proposal; one-char
        // priors match only one-char proposals.
        let by_len = TypeId::custom(TypeFamily::String, "by_len");
        let registry = RuleRegistry::new()
            .with_rule(
                by_len.clone(),
                FnRule::new("by_len", &[TypeFamily::String], |req| {
                    let (a, b) = req.strings("by_len")?;
                    Ok(EqualityResponse::from_bool(
                        a.len() == b.len() || (a.len() == 2 && b.len() == 1),
                    ))
                }),
            )
            .unwrap();
        let s = |v: &str| TypedValue::string(v).with_type(by_len.clone()).unwrap();

        // First-fit in canonical order would pair "aa" with "x" and strand "c".
        let prior = TypedValue::set(vec![s("aa"), s("c")]);
        let proposed = TypedValue::set(vec![s("x"), s("yy")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        assert_eq!(out.merged, prior);
        assert_eq!(out.stats.set_candidates_compared, 4);
    }

    #[test]
    fn set_of_objects_matches_semantically() {
        let registry = ci_registry();
        let member = |host: &str, port: i64| {
            TypedValue::object([("host", ci_string(host)), ("port", TypedValue::int(port))])
        };
        let prior = TypedValue::set(vec![member("A.example", 80), member("B.example", 443)]);
        let proposed = TypedValue::set(vec![member("b.example", 443), member("a.example", 80)]);
        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        assert_eq!(out.merged, prior);
    }

    #[test]
    fn set_trial_diagnostics_are_discarded() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("noisy", &[TypeFamily::String], |req| {
                    let (a, b) = req.strings("noisy")?;
                    Ok(EqualityResponse::from_bool(a.eq_ignore_ascii_case(b))
                        .with_diagnostic(Diagnostic::warning("compared", format!("{a} vs {b}"))))
                }),
            )
            .unwrap();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("B")]);
        let proposed = TypedValue::set(vec![ci_string("a"), ci_string("b")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        // Four trial comparisons ran, only the two matched pairs report.
        assert_eq!(out.stats.set_candidates_compared, 4);
        assert_eq!(out.diagnostics.count(Severity::Warning), 2);
    }

    #[test]
    fn set_trials_of_unmatched_members_keep_warnings() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("noisy", &[TypeFamily::String], |req| {
                    let (a, b) = req.strings("noisy")?;
                    Ok(EqualityResponse::from_bool(a.eq_ignore_ascii_case(b))
                        .with_diagnostic(Diagnostic::warning("compared", format!("{a} vs {b}"))))
                }),
            )
            .unwrap();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("x")]);
        let proposed = TypedValue::set(vec![ci_string("a"), ci_string("y")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        // A/a matched; every other trial touches the unmatched x or y.
        let details: Vec<&str> = out.diagnostics.warnings().map(|d| d.detail.as_str()).collect();
        assert_eq!(details, vec!["A vs a", "A vs y", "x vs a", "x vs y"]);
    }

    #[test]
    fn set_member_rule_error_is_reported() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("always_errors", &[TypeFamily::String], |_| {
                    Ok(EqualityResponse::keep_prior().with_diagnostic(Diagnostic::error("boom", "")))
                }),
            )
            .unwrap();
        let prior = TypedValue::set(vec![ci_string("x")]);
        let proposed = TypedValue::set(vec![ci_string("X")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.merged, proposed);

        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].summary, "boom");
        let member_path = AttributePath::root().element(ci_string("X").canonical_string().as_str());
        assert_eq!(errors[0].path, member_path);
    }

    #[test]
    fn set_member_rule_failure_is_reported() {
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("fails", &[TypeFamily::String], |_| {
                    Err(RuleError::failed("fails", "cannot parse"))
                }),
            )
            .unwrap();
        let prior = TypedValue::set(vec![ci_string("x")]);
        let proposed = TypedValue::set(vec![ci_string("X")]);
        let out = walk(&registry, &prior, &proposed);
        assert!(!out.keep_prior);
        assert_eq!(out.stats.rule_failures, 1);
        assert_eq!(out.diagnostics.count(Severity::Error), 1);
    }

    // -----------------------------------------------------------------------
    // 9. Aggregate-level rules
    // -----------------------------------------------------------------------
    #[test]
    fn aggregate_rule_can_accept_composed_value() {
        let unordered = TypeId::custom(TypeFamily::Sequence, "unordered_list");
        let registry = RuleRegistry::new()
            .with_rule(
                unordered.clone(),
                FnRule::new("order_insensitive", &[TypeFamily::Sequence], |req| {
                    let mut a: Vec<String> = req.prior.elements().unwrap_or_default().iter().map(|v| v.to_string()).collect();
                    let mut b: Vec<String> = req.proposed.elements().unwrap_or_default().iter().map(|v| v.to_string()).collect();
                    a.sort();
                    b.sort();
                    Ok(EqualityResponse::from_bool(a == b))
                }),
            )
            .unwrap();
        let prior = TypedValue::sequence(ints(&[1, 2])).with_type(unordered.clone()).unwrap();
        let proposed = TypedValue::sequence(ints(&[2, 1])).with_type(unordered).unwrap();

        let out = walk(&registry, &prior, &proposed);
        assert!(out.keep_prior);
        assert_eq!(out.merged, prior);
        assert_eq!(out.stats.rule_invocations, 1);
    }

    #[test]
    fn aggregate_rule_not_called_when_policy_already_equal() {
        let tagged = TypeId::custom(TypeFamily::Map, "labels");
        let registry = RuleRegistry::new()
            .with_rule(
                tagged.clone(),
                FnRule::new("never", &[TypeFamily::Map], |_| panic!("must not be called")),
            )
            .unwrap();
        let v = TypedValue::map([("k", TypedValue::int(1))]).with_type(tagged).unwrap();
        let out = walk(&registry, &v, &v.clone());
        assert!(out.keep_prior);
        assert_eq!(out.stats.rule_invocations, 0);
    }

    // -----------------------------------------------------------------------
    // 10. Limits and cancellation
    // -----------------------------------------------------------------------
    #[test]
    fn exceeding_max_depth_is_a_node_error() {
        let registry = RuleRegistry::new();
        let nested = |leaf: i64| {
            TypedValue::object([("a", TypedValue::object([("b", TypedValue::int(leaf))]))])
        };
        let config = WalkConfig {
            max_depth: 1,
            ..Default::default()
        };
        let out = Walker::new(&registry)
            .with_config(config)
            .walk(&nested(1), &nested(1))
            .unwrap();
        assert!(!out.keep_prior);
        assert_eq!(out.merged, nested(1));
        let err = out.diagnostics.errors().next().unwrap();
        assert_eq!(err.path, AttributePath::root().attribute("a").attribute("b"));
    }

    #[test]
    fn cancelled_token_aborts_walk() {
        let registry = RuleRegistry::new();
        let token = CancelToken::new();
        token.cancel();
        let err = Walker::new(&registry)
            .with_cancellation(token)
            .walk(&TypedValue::int(1), &TypedValue::int(1))
            .unwrap_err();
        match err {
            WalkError::Cancelled {
                reason,
                diagnostics,
                ..
            } => {
                assert_eq!(reason, CancelReason::Requested);
                assert_eq!(diagnostics.count(Severity::Error), 1);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_from_inside_a_rule_stops_the_walk() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("cancels", &[TypeFamily::String], move |_| {
                    trigger.cancel();
                    Ok(EqualityResponse::keep_prior())
                }),
            )
            .unwrap();
        let prior = TypedValue::sequence(vec![ci_string("A"), ci_string("B")]);
        let proposed = TypedValue::sequence(vec![ci_string("a"), ci_string("b")]);

        let err = Walker::new(&registry)
            .with_cancellation(token)
            .walk(&prior, &proposed)
            .unwrap_err();
        assert!(err.is_cancelled());
        match err {
            WalkError::Cancelled { path, .. } => assert_eq!(path, AttributePath::root().index(1)),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_keeps_diagnostics_from_earlier_siblings() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let registry = RuleRegistry::new()
            .with_rule(
                ci(),
                FnRule::new("warns_then_cancels", &[TypeFamily::String], move |_| {
                    trigger.cancel();
                    Ok(EqualityResponse::keep_prior()
                        .with_diagnostic(Diagnostic::warning("slow lookup", "")))
                }),
            )
            .unwrap();
        let prior = TypedValue::object([(
            "hosts",
            TypedValue::sequence(vec![ci_string("A"), ci_string("B")]),
        )]);
        let proposed = TypedValue::object([(
            "hosts",
            TypedValue::sequence(vec![ci_string("a"), ci_string("b")]),
        )]);

        let err = Walker::new(&registry)
            .with_cancellation(token)
            .walk(&prior, &proposed)
            .unwrap_err();
        let hosts = AttributePath::root().attribute("hosts");
        let diagnostics = err.diagnostics().unwrap();
        let entries: Vec<_> = diagnostics.iter().map(|d| (d.severity, d.path.clone())).collect();
        assert_eq!(
            entries,
            vec![
                (Severity::Warning, hosts.index(0)),
                (Severity::Error, hosts.index(1)),
            ]
        );
    }

    #[test]
    fn zero_deadline_cancels_immediately() {
        let registry = RuleRegistry::new();
        let config = WalkConfig {
            deadline: Some(std::time::Duration::ZERO),
            ..Default::default()
        };
        let err = Walker::new(&registry)
            .with_config(config)
            .walk(&TypedValue::bool(true), &TypedValue::bool(true))
            .unwrap_err();
        assert!(matches!(
            err,
            WalkError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                ..
            }
        ));
    }

    #[test]
    fn walker_is_reusable_across_walks() {
        let registry = ci_registry();
        let walker = Walker::new(&registry);
        let a = walker.walk(&ci_string("A"), &ci_string("a")).unwrap();
        let b = walker.walk(&ci_string("A"), &ci_string("a")).unwrap();
        assert_eq!(a.stats.rule_invocations, 1);
        assert_eq!(b.stats.rule_invocations, 1);
        assert_eq!(a.merged, b.merged);
    }

    // -----------------------------------------------------------------------
    // 11. Concurrency
    // -----------------------------------------------------------------------
    #[test]
    fn concurrent_walks_share_one_registry() {
        init_tracing();
        let registry = ci_registry();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("B"), ci_string("C")]);
        let proposed = TypedValue::set(vec![ci_string("c"), ci_string("b"), ci_string("a")]);

        let outcomes: Vec<WalkOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| walk(&registry, &prior, &proposed)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for out in &outcomes {
            assert!(out.keep_prior);
            assert_eq!(out.merged.canonical_string(), prior.canonical_string());
            assert_eq!(out.stats.rule_invocations, outcomes[0].stats.rule_invocations);
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let registry = ci_registry();
        let prior = TypedValue::set(vec![ci_string("A"), ci_string("b")]);
        let proposed = TypedValue::set(vec![ci_string("a"), ci_string("c")]);
        let (prior_before, proposed_before) = (prior.clone(), proposed.clone());
        let _ = walk(&registry, &prior, &proposed);
        assert_eq!(prior.canonical_string(), prior_before.canonical_string());
        assert_eq!(proposed.canonical_string(), proposed_before.canonical_string());
    }
    // -----------------------------------------------------------------------
    // 12. Properties
    // -----------------------------------------------------------------------
    fn leaf() -> impl Strategy<Value = TypedValue> {
        prop_oneof![
            any::<bool>().prop_map(TypedValue::bool),
            any::<i64>().prop_map(TypedValue::int),
            (-1.0e6f64..1.0e6).prop_map(TypedValue::float),
            prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
                .prop_map(TypedValue::float),
            "[a-zA-Z]{0,6}".prop_map(TypedValue::string),
            "[a-zA-Z]{0,6}".prop_map(|s| ci_string(&s)),
        ]
    }

    fn tree() -> impl Strategy<Value = TypedValue> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(TypedValue::sequence),
                proptest::collection::vec(inner.clone(), 0..4).prop_map(TypedValue::set),
                proptest::collection::btree_map("[a-z]{1,3}", inner.clone(), 0..4)
                    .prop_map(|m| TypedValue::map(m)),
                proptest::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                    .prop_map(|m| TypedValue::object(m)),
            ]
        })
    }

    proptest! {
        #[test]
        fn walking_a_tree_against_itself_keeps_prior(value in tree()) {
            let registry = ci_registry();
            let out = walk(&registry, &value, &value.clone());
            prop_assert!(out.keep_prior);
            prop_assert!(out.diagnostics.is_empty());
            prop_assert_eq!(out.merged.canonical_string(), value.canonical_string());
            prop_assert_eq!(out.stats.rule_invocations, 0);
        }

        #[test]
        fn set_result_does_not_depend_on_member_order(
            members in proptest::collection::vec("[a-cA-C]{1,2}", 1..6),
            others in proptest::collection::vec("[a-cA-C]{1,2}", 1..6),
        ) {
            let registry = ci_registry();
            let as_set = |items: &[String]| TypedValue::set(items.iter().map(|s| ci_string(s)).collect());
            let prior = as_set(&members);
            let proposed = as_set(&others);
            let mut reversed = others.clone();
            reversed.reverse();
            let proposed_reversed = as_set(&reversed);

            let a = walk(&registry, &prior, &proposed);
            let b = walk(&registry, &prior, &proposed_reversed);
            prop_assert_eq!(a.keep_prior, b.keep_prior);
            prop_assert_eq!(a.merged.canonical_string(), b.merged.canonical_string());
            prop_assert_eq!(a.merged.elements(), b.merged.elements());
        }
    }
}
