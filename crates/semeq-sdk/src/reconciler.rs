use std::sync::Arc;

use rayon::prelude::*;
use semeq_rules::{CancelToken, RegistryConfig, RuleRegistry};
use semeq_types::{Diagnostic, Diagnostics, TypedValue};
use semeq_walk::{WalkConfig, WalkOutcome, WalkStats, Walker};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

/// High-level reconciliation API.
///
/// Holds a shared, read-only rule registry and a walk configuration. Cloning
/// a reconciler is cheap and every clone uses the same registry.
#[derive(Clone, Debug)]
pub struct Reconciler {
    registry: Arc<RuleRegistry>,
    config: WalkConfig,
}

impl Reconciler {
    pub fn new(registry: RuleRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Use a registry that is already shared elsewhere.
    pub fn from_shared(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            config: WalkConfig::default(),
        }
    }

    /// Build from TOML documents for the rule bindings and the walk settings.
    pub fn from_toml(rules: &str, walk: &str) -> SdkResult<Self> {
        let registry = RuleRegistry::from_config(&RegistryConfig::from_toml_str(rules)?)?;
        let config = WalkConfig::from_toml_str(walk)?;
        info!(rules = registry.len(), "reconciler configured");
        Ok(Self::new(registry).with_config(config))
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Compare one prior/proposed pair.
    pub fn compare(&self, prior: &TypedValue, proposed: &TypedValue) -> SdkResult<ReconcileReport> {
        self.compare_with_cancellation(prior, proposed, CancelToken::new())
    }

    /// Compare one pair, stopping early once `cancel` fires.
    pub fn compare_with_cancellation(
        &self,
        prior: &TypedValue,
        proposed: &TypedValue,
        cancel: CancelToken,
    ) -> SdkResult<ReconcileReport> {
        let outcome = Walker::new(&self.registry)
            .with_config(self.config.clone())
            .with_cancellation(cancel)
            .walk(prior, proposed)?;
        Ok(ReconcileReport::from(outcome))
    }

    /// Compare many independent pairs on a dedicated thread pool.
    ///
    /// `threads == 0` lets rayon pick the thread count. Results come back in
    /// input order; one pair failing does not affect the others.
    pub fn compare_batch(
        &self,
        pairs: &[(TypedValue, TypedValue)],
        threads: usize,
    ) -> SdkResult<Vec<SdkResult<ReconcileReport>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("semeq-worker-{i}"))
            .build()
            .map_err(|e| SdkError::ThreadPool(e.to_string()))?;

        debug!(pairs = pairs.len(), threads = pool.current_num_threads(), "batch comparison started");
        let reports: Vec<SdkResult<ReconcileReport>> = pool.install(|| {
            pairs
                .par_iter()
                .map(|(prior, proposed)| self.compare(prior, proposed))
                .collect()
        });
        let failed = reports.iter().filter(|r| r.is_err()).count();
        debug!(pairs = pairs.len(), failed, "batch comparison finished");
        Ok(reports)
    }
}

// ---------------------------------------------------------------------------
// ReconcileReport
// ---------------------------------------------------------------------------

/// The result of one reconciliation.
#[derive(Clone, Debug, Serialize)]
pub struct ReconcileReport {
    /// Value to persist: prior representations wherever they were kept.
    pub merged: TypedValue,
    pub keep_prior: bool,
    pub diagnostics: Diagnostics,
    pub stats: WalkStats,
}

impl ReconcileReport {
    /// The proposed value differs semantically from the prior one.
    pub fn changed(&self) -> bool {
        !self.keep_prior
    }

    /// `Error` diagnostics a caller would normally refuse to proceed past.
    pub fn blocking_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.errors()
    }

    /// The merged value, or [`SdkError::Blocked`] if any error was diagnosed.
    pub fn into_result(self) -> SdkResult<TypedValue> {
        if self.diagnostics.has_error() {
            return Err(SdkError::Blocked {
                diagnostics: self.diagnostics,
            });
        }
        Ok(self.merged)
    }
}

impl From<WalkOutcome> for ReconcileReport {
    fn from(outcome: WalkOutcome) -> Self {
        Self {
            merged: outcome.merged,
            keep_prior: outcome.keep_prior,
            diagnostics: outcome.diagnostics,
            stats: outcome.stats,
        }
    }
}
