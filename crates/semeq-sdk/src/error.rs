use semeq_types::Diagnostics;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("walk error: {0}")]
    Walk(#[from] semeq_walk::WalkError),

    #[error("rule error: {0}")]
    Rule(#[from] semeq_rules::RuleError),

    #[error("comparison blocked by {} error diagnostic(s)", .diagnostics.count(semeq_types::Severity::Error))]
    Blocked { diagnostics: Diagnostics },

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
