//! Built-in comparison policies, one per type family group.
//!
//! Each policy resolves a pair that already passed the walker's type, depth
//! and null/unknown checks, recursing through the traversal for children.

pub(crate) mod map;
pub(crate) mod object;
pub(crate) mod scalar;
pub(crate) mod sequence;
pub(crate) mod set;

use semeq_types::TypedValue;

use crate::walker::Resolved;

/// Raw-equality resolution for payloads that do not match their declared
/// family (e.g. hand-deserialized trees).
pub(crate) fn raw_fallback(prior: &TypedValue, proposed: &TypedValue) -> Resolved {
    Resolved::decide(prior.value() == proposed.value(), prior, proposed)
}
