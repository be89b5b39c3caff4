use semeq_types::{AttributePath, Diagnostic, Diagnostics, TypeFamily, TypedValue};

use crate::cancel::CancelToken;
use crate::error::RuleError;

// ---------------------------------------------------------------------------
// EqualityRequest
// ---------------------------------------------------------------------------

/// A single prior/proposed pair handed to a rule.
///
/// The walker only builds a request when both sides share the same declared
/// type and are neither null nor unknown.
#[derive(Clone, Copy, Debug)]
pub struct EqualityRequest<'a> {
    /// Location of the pair. Informational only.
    pub path: &'a AttributePath,
    /// The previously observed value.
    pub prior: &'a TypedValue,
    /// The freshly computed candidate value.
    pub proposed: &'a TypedValue,
    /// Stop signal for rules that perform slow work.
    pub cancellation: Option<&'a CancelToken>,
}

impl<'a> EqualityRequest<'a> {
    pub fn new(path: &'a AttributePath, prior: &'a TypedValue, proposed: &'a TypedValue) -> Self {
        Self {
            path,
            prior,
            proposed,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancelToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Rules doing I/O should poll this and bail out with an error.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(CancelToken::is_cancelled)
    }

    /// Both sides as strings, or a rule failure naming `rule`.
    pub fn strings(&self, rule: &str) -> Result<(&'a str, &'a str), RuleError> {
        match (self.prior.as_str(), self.proposed.as_str()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(RuleError::failed(rule, "expected string values on both sides")),
        }
    }

    /// Both sides as floats, or a rule failure naming `rule`.
    pub fn floats(&self, rule: &str) -> Result<(f64, f64), RuleError> {
        match (self.prior.as_float(), self.proposed.as_float()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(RuleError::failed(rule, "expected float values on both sides")),
        }
    }
}

// ---------------------------------------------------------------------------
// EqualityResponse
// ---------------------------------------------------------------------------

/// A rule's verdict for one pair.
///
/// `keep_prior = true` asks the walker to retain the prior representation.
/// An `Error` diagnostic overrides that request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EqualityResponse {
    pub keep_prior: bool,
    pub diagnostics: Diagnostics,
}

impl EqualityResponse {
    pub fn keep_prior() -> Self {
        Self {
            keep_prior: true,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn use_proposed() -> Self {
        Self::default()
    }

    pub fn from_bool(keep_prior: bool) -> Self {
        Self {
            keep_prior,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

// ---------------------------------------------------------------------------
// EqualityRule trait
// ---------------------------------------------------------------------------

/// A custom semantic-equality hook for one declared type.
///
/// Rules must not mutate their inputs and are expected to be CPU-bound.
/// The trait is object-safe and `Send + Sync` so one registry can serve
/// concurrent walks.
pub trait EqualityRule: Send + Sync {
    /// Human-readable name (e.g., "case_insensitive").
    fn name(&self) -> &str;

    /// Families this rule can be registered for.
    fn families(&self) -> &[TypeFamily];

    /// Decide whether the prior value should be kept.
    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError>;
}
