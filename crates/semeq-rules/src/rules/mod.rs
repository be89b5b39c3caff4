//! Built-in custom equality rules.
//!
//! None of these are active by default; each must be registered for the
//! type it should govern.

pub mod func;
pub mod numeric;
pub mod string;

pub use func::FnRule;
pub use numeric::{FloatTolerance, NumericString};
pub use string::{CaseInsensitiveString, TrimmedString};
