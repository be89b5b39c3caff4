/// Errors raised while building the registry or evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// A type may have at most one registered rule.
    #[error("type '{type_id}' already has rule '{existing}' registered")]
    AlreadyRegistered { type_id: String, existing: String },

    /// The rule does not accept values of the type's family.
    #[error("rule '{rule}' cannot compare values of type '{type_id}'")]
    UnsupportedFamily { rule: String, type_id: String },

    /// Registry configuration could not be parsed or applied.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A rule could not complete its comparison.
    #[error("rule '{rule}' failed: {message}")]
    Failed { rule: String, message: String },
}

impl RuleError {
    /// Create a rule failure with a rule name and message.
    pub fn failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for rule results.
pub type RuleResult<T> = Result<T, RuleError>;
