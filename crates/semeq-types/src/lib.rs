//! Foundation types for semantic-equality reconciliation.
//!
//! This crate provides the value model that the rule registry and the walker
//! operate on. Every other semeq crate depends on `semeq-types`.
//!
//! # Key Types
//!
//! - [`TypedValue`] / [`Value`] — Tagged value tree node carrying its declared type
//! - [`TypeId`] / [`TypeFamily`] — Declared type identity used for rule dispatch
//! - [`AttributePath`] / [`PathStep`] — Location of a node, used for diagnostics only
//! - [`Diagnostic`] / [`Diagnostics`] — Path-tagged findings collected during a walk
//! - [`Fingerprint`] — Domain-separated BLAKE3 hash of a value's canonical form

pub mod canonical;
pub mod diagnostic;
pub mod error;
pub mod path;
pub mod value;

pub use canonical::{canonical_json, canonical_string, Fingerprint};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::TypeError;
pub use path::{AttributePath, PathStep};
pub use value::{TypeFamily, TypeId, TypedValue, Value};
