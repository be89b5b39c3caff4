use std::sync::Arc;

use serde::{Deserialize, Serialize};
use semeq_types::{TypeFamily, TypeId};

use crate::error::{RuleError, RuleResult};
use crate::rule::EqualityRule;
use crate::rules::{CaseInsensitiveString, FloatTolerance, NumericString, TrimmedString};

/// Declarative description of which built-in rule binds to which type.
///
/// ```toml
/// [[bindings]]
/// family = "string"
/// type_name = "hostname"
/// rule = { kind = "case_insensitive" }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub bindings: Vec<RuleBinding>,
}

impl RegistryConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> RuleResult<Self> {
        toml::from_str(s).map_err(|e| RuleError::InvalidConfig(e.to_string()))
    }
}

/// One type-to-rule binding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleBinding {
    /// Family of the bound type.
    pub family: TypeFamily,
    /// Custom type name within the family. Built-in names are allowed.
    pub type_name: String,
    /// The rule to install.
    pub rule: BuiltinRule,
}

impl RuleBinding {
    pub fn type_id(&self) -> RuleResult<TypeId> {
        if self.type_name == self.family.name() {
            return Ok(TypeId::builtin(self.family));
        }
        TypeId::try_custom(self.family, self.type_name.clone())
            .map_err(|e| RuleError::InvalidConfig(e.to_string()))
    }
}

/// Built-in rules selectable from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinRule {
    CaseInsensitive,
    Trimmed,
    NumericString,
    FloatTolerance { epsilon: f64 },
}

impl BuiltinRule {
    /// Instantiate the rule.
    pub fn build(&self) -> RuleResult<Arc<dyn EqualityRule>> {
        Ok(match self {
            Self::CaseInsensitive => Arc::new(CaseInsensitiveString),
            Self::Trimmed => Arc::new(TrimmedString),
            Self::NumericString => Arc::new(NumericString),
            Self::FloatTolerance { epsilon } => Arc::new(FloatTolerance::new(*epsilon)?),
        })
    }
}
