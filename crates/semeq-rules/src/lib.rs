//! Equality rule registry for semantic-equality reconciliation.
//!
//! A rule decides whether a prior and a proposed value of one declared type
//! should be treated as unchanged even though their raw representations
//! differ. The [`RuleRegistry`] maps type identities to at most one rule
//! each; unregistered types use their default policy in the walker.
//!
//! # Quick Start
//!
//! ```rust
//! use semeq_rules::{CaseInsensitiveString, EqualityRequest, RuleRegistry};
//! use semeq_types::{AttributePath, TypeFamily, TypeId, TypedValue};
//!
//! let region = TypeId::custom(TypeFamily::String, "region");
//! let registry = RuleRegistry::new()
//!     .with_rule(region.clone(), CaseInsensitiveString)
//!     .unwrap();
//!
//! let prior = TypedValue::string("GRA7").with_type(region.clone()).unwrap();
//! let proposed = TypedValue::string("gra7").with_type(region.clone()).unwrap();
//! let path = AttributePath::root();
//! let rule = registry.resolve(&region).unwrap();
//! let resp = rule
//!     .semantic_equals(&EqualityRequest::new(&path, &prior, &proposed))
//!     .unwrap();
//! assert!(resp.keep_prior);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod registry;
pub mod rule;
pub mod rules;

pub use cancel::{CancelReason, CancelToken};
pub use config::{BuiltinRule, RegistryConfig, RuleBinding};
pub use error::{RuleError, RuleResult};
pub use registry::RuleRegistry;
pub use rule::{EqualityRequest, EqualityResponse, EqualityRule};
pub use rules::{CaseInsensitiveString, FloatTolerance, FnRule, NumericString, TrimmedString};
