use semeq_types::TypeFamily;

use crate::error::RuleError;
use crate::rule::{EqualityRequest, EqualityResponse, EqualityRule};

type RuleFn =
    dyn Fn(&EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> + Send + Sync;

/// Adapts a closure into an [`EqualityRule`].
pub struct FnRule {
    name: String,
    families: Vec<TypeFamily>,
    func: Box<RuleFn>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, families: &[TypeFamily], func: F) -> Self
    where
        F: Fn(&EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            families: families.to_vec(),
            func: Box::new(func),
        }
    }
}

impl EqualityRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn families(&self) -> &[TypeFamily] {
        &self.families
    }

    fn semantic_equals(&self, request: &EqualityRequest<'_>) -> Result<EqualityResponse, RuleError> {
        (self.func)(request)
    }
}
