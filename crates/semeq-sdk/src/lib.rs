//! High-level API for semantic-equality reconciliation.
//!
//! Wraps the rule registry and the walker behind a single [`Reconciler`]
//! that can be shared across threads, and re-exports the types most callers
//! need so that depending on this crate alone is enough.
//!
//! ```rust
//! use semeq_sdk::{CaseInsensitiveString, Reconciler, RuleRegistry, TypeFamily, TypeId, TypedValue};
//!
//! let region = TypeId::custom(TypeFamily::String, "region");
//! let reconciler = Reconciler::new(
//!     RuleRegistry::new().with_rule(region.clone(), CaseInsensitiveString).unwrap(),
//! );
//!
//! let prior = TypedValue::object([("region", TypedValue::string("GRA7").with_type(region.clone()).unwrap())]);
//! let proposed = TypedValue::object([("region", TypedValue::string("gra7").with_type(region).unwrap())]);
//!
//! let merged = reconciler.compare(&prior, &proposed).unwrap().into_result().unwrap();
//! assert_eq!(merged, prior);
//! ```

pub mod error;
pub mod reconciler;

pub use error::{SdkError, SdkResult};
pub use reconciler::{ReconcileReport, Reconciler};

// Re-export key types
pub use semeq_rules::{
    CancelReason, CancelToken, CaseInsensitiveString, EqualityRequest, EqualityResponse,
    EqualityRule, FloatTolerance, FnRule, NumericString, RegistryConfig, RuleError, RuleRegistry,
    TrimmedString,
};
pub use semeq_types::{
    AttributePath, Diagnostic, Diagnostics, PathStep, Severity, TypeFamily, TypeId, TypedValue,
    Value,
};
pub use semeq_walk::{WalkConfig, WalkError, WalkOutcome, WalkStats, Walker};
