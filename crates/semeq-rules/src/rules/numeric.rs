use semeq_types::{Diagnostic, TypeFamily};

use crate::error::{RuleError, RuleResult};
use crate::rule::{EqualityRequest, EqualityResponse, EqualityRule};

// ---------------------------------------------------------------------------
// NumericString
// ---------------------------------------------------------------------------

/// Strings holding the same decimal number are equal.
///
/// `"1.50"`, `"1.5"`, `"+1.5"` and `"15e-1"` all compare equal. Input that
/// is not a decimal number compares unequal and produces a warning.
pub struct NumericString;

impl EqualityRule for NumericString {
    fn name(&self) -> &str {
        "numeric_string"
    }

    fn families(&self) -> &[TypeFamily] {
        &[TypeFamily::String]
    }

    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> {
        let (prior, proposed) = request.strings(self.name())?;
        match (canonical_decimal(prior), canonical_decimal(proposed)) {
            (Some(a), Some(b)) => Ok(EqualityResponse::from_bool(a == b)),
            _ => Ok(EqualityResponse::use_proposed().with_diagnostic(Diagnostic::warning(
                "Value is not numeric",
                format!("cannot compare {prior:?} and {proposed:?} as decimal numbers"),
            ))),
        }
    }
}

/// Normalize a decimal literal to `[-]<digits>e<exp>` with no leading or
/// trailing zeros in `digits`. Zero of any sign normalizes to `"0"`.
pub fn canonical_decimal(s: &str) -> Option<String> {
    let s = s.trim();
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (mantissa, exp) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], rest[pos + 1..].parse::<i64>().ok()?),
        None => (rest, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let mut exp = exp.checked_sub(i64::try_from(frac_part.len()).ok()?)?;

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Some("0".into());
    }
    let significant = trimmed.trim_end_matches('0');
    exp = exp.checked_add(i64::try_from(trimmed.len() - significant.len()).ok()?)?;

    let sign = if negative { "-" } else { "" };
    Some(format!("{sign}{significant}e{exp}"))
}

// ---------------------------------------------------------------------------
// FloatTolerance
// ---------------------------------------------------------------------------

/// Floats within an absolute tolerance of each other are equal.
#[derive(Clone, Copy, Debug)]
pub struct FloatTolerance {
    epsilon: f64,
}

impl FloatTolerance {
    /// Fails for a negative or NaN tolerance.
    pub fn new(epsilon: f64) -> RuleResult<Self> {
        if epsilon.is_nan() || epsilon < 0.0 {
            return Err(RuleError::InvalidConfig(format!(
                "float tolerance must be a non-negative number, got {epsilon}"
            )));
        }
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl EqualityRule for FloatTolerance {
    fn name(&self) -> &str {
        "float_tolerance"
    }

    fn families(&self) -> &[TypeFamily] {
        &[TypeFamily::Float]
    }

    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> {
        let (prior, proposed) = request.floats(self.name())?;
        // Same-signed infinities subtract to NaN.
        let equal = prior == proposed || (prior - proposed).abs() <= self.epsilon;
        Ok(EqualityResponse::from_bool(equal))
    }
}
