use semeq_types::TypeFamily;

use crate::error::RuleError;
use crate::rule::{EqualityRequest, EqualityResponse, EqualityRule};

const STRING_ONLY: &[TypeFamily] = &[TypeFamily::String];

/// Strings that differ only in letter case are equal.
pub struct CaseInsensitiveString;

impl EqualityRule for CaseInsensitiveString {
    fn name(&self) -> &str {
        "case_insensitive"
    }

    fn families(&self) -> &[TypeFamily] {
        STRING_ONLY
    }

    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> {
        let (prior, proposed) = request.strings(self.name())?;
        Ok(EqualityResponse::from_bool(
            prior.to_lowercase() == proposed.to_lowercase(),
        ))
    }
}

/// Strings that differ only in leading or trailing whitespace are equal.
pub struct TrimmedString;

impl EqualityRule for TrimmedString {
    fn name(&self) -> &str {
        "trimmed"
    }

    fn families(&self) -> &[TypeFamily] {
        STRING_ONLY
    }

    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> {
        let (prior, proposed) = request.strings(self.name())?;
        Ok(EqualityResponse::from_bool(prior.trim() == proposed.trim()))
    }
}
