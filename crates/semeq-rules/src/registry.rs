use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use semeq_types::TypeId;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{RuleError, RuleResult};
use crate::rule::EqualityRule;

/// Maps declared type identities to their custom equality rule.
///
/// Populated once at startup, then only read. Types without an entry fall
/// back to raw equality (scalars) or to the walker's built-in recursive
/// policy (aggregates).
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<TypeId, Arc<dyn EqualityRule>>,
}

impl RuleRegistry {
    /// An empty registry: every type uses its default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declarative bindings.
    pub fn from_config(config: &RegistryConfig) -> RuleResult<Self> {
        let mut registry = Self::new();
        for binding in &config.bindings {
            let type_id = binding.type_id()?;
            registry.register(type_id, binding.rule.build()?)?;
        }
        Ok(registry)
    }

    /// Register `rule` for `type_id`.
    ///
    /// Fails if the type already has a rule or the rule does not accept the
    /// type's family.
    pub fn register(&mut self, type_id: TypeId, rule: Arc<dyn EqualityRule>) -> RuleResult<()> {
        if !rule.families().contains(&type_id.family()) {
            return Err(RuleError::UnsupportedFamily {
                rule: rule.name().to_string(),
                type_id: type_id.to_string(),
            });
        }
        if let Some(existing) = self.rules.get(&type_id) {
            return Err(RuleError::AlreadyRegistered {
                type_id: type_id.to_string(),
                existing: existing.name().to_string(),
            });
        }
        debug!(type_id = %type_id, rule = rule.name(), "registered equality rule");
        self.rules.insert(type_id, rule);
        Ok(())
    }

    /// Convenience wrapper around [`Self::register`] for owned rules.
    pub fn register_rule<R: EqualityRule + 'static>(
        &mut self,
        type_id: TypeId,
        rule: R,
    ) -> RuleResult<()> {
        self.register(type_id, Arc::new(rule))
    }

    /// Builder-style registration.
    pub fn with_rule<R: EqualityRule + 'static>(mut self, type_id: TypeId, rule: R) -> RuleResult<Self> {
        self.register_rule(type_id, rule)?;
        Ok(self)
    }

    /// The rule registered for `type_id`, if any.
    pub fn resolve(&self, type_id: &TypeId) -> Option<&dyn EqualityRule> {
        self.rules.get(type_id).map(|r| r.as_ref())
    }

    pub fn is_registered(&self, type_id: &TypeId) -> bool {
        self.rules.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered type identities, sorted.
    pub fn type_ids(&self) -> Vec<&TypeId> {
        let mut ids: Vec<&TypeId> = self.rules.keys().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for id in self.type_ids() {
            if let Some(rule) = self.rules.get(id) {
                map.entry(&id.to_string(), &rule.name());
            }
        }
        map.finish()
    }
}
