use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use semeq_rules::{CancelReason, CancelToken, EqualityRequest, EqualityRule, RuleRegistry};
use semeq_types::{AttributePath, Diagnostic, Diagnostics, TypeFamily, TypedValue};
use tracing::{debug, trace, warn};

use crate::config::WalkConfig;
use crate::error::{WalkError, WalkResult};
use crate::outcome::{NodeState, WalkOutcome, WalkStats};
use crate::policy;

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// Drives a semantic-equality comparison of a prior and a proposed tree.
///
/// A walker borrows a read-only [`RuleRegistry`] and keeps no state between
/// calls to [`Self::walk`], so one walker can be reused and many walkers can
/// share one registry across threads.
pub struct Walker<'r> {
    registry: &'r RuleRegistry,
    config: WalkConfig,
    cancel: CancelToken,
}

impl<'r> Walker<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            config: WalkConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Compare `prior` against `proposed` and build the merged tree.
    ///
    /// Node-level failures are reported as diagnostics; only cancellation
    /// aborts the walk.
    pub fn walk(&self, prior: &TypedValue, proposed: &TypedValue) -> WalkResult<WalkOutcome> {
        let started = Instant::now();
        let cancel = match self.config.deadline {
            Some(limit) => self.cancel.clone().with_deadline(started + limit),
            None => self.cancel.clone(),
        };

        debug!(type_id = %proposed.type_id(), "semantic equality walk started");

        let mut traversal = Traversal::new(self.registry, &self.config, &cancel);
        let root = AttributePath::root();
        match traversal.visit(&root, prior, proposed) {
            Ok(resolved) => {
                let mut stats = traversal.stats;
                stats.elapsed = started.elapsed();
                debug!(
                    keep_prior = resolved.keep_prior,
                    diagnostics = resolved.diagnostics.len(),
                    nodes = stats.nodes_visited,
                    rules = stats.rule_invocations,
                    "semantic equality walk finished"
                );
                Ok(WalkOutcome {
                    merged: resolved.merged,
                    keep_prior: resolved.keep_prior,
                    diagnostics: resolved.diagnostics,
                    stats,
                })
            }
            Err(Interrupted {
                path,
                reason,
                mut diagnostics,
            }) => {
                warn!(path = %path, %reason, "semantic equality walk cancelled");
                diagnostics.push(
                    Diagnostic::error(
                        "Semantic equality traversal cancelled",
                        format!("stopped before comparing {path}: {reason}"),
                    )
                    .at(path.clone()),
                );
                Err(WalkError::Cancelled {
                    path,
                    reason,
                    diagnostics,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal internals
// ---------------------------------------------------------------------------

/// The resolution of one node: its merged value, whether that is the prior
/// representation, and everything diagnosed at or below it.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub merged: TypedValue,
    pub keep_prior: bool,
    pub diagnostics: Diagnostics,
}

impl Resolved {
    pub fn keep(prior: &TypedValue) -> Self {
        Self::decide(true, prior, prior)
    }

    pub fn take(proposed: &TypedValue) -> Self {
        Self {
            merged: proposed.clone(),
            keep_prior: false,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn decide(keep_prior: bool, prior: &TypedValue, proposed: &TypedValue) -> Self {
        Self {
            merged: if keep_prior { prior.clone() } else { proposed.clone() },
            keep_prior,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    /// Usable as a set-member match: equal and free of errors.
    pub fn is_clean_match(&self) -> bool {
        self.keep_prior && !self.diagnostics.has_error()
    }
}

/// A custom rule's verdict after the walker applied its overrides.
pub(crate) struct RuleVerdict {
    pub keep_prior: bool,
    pub diagnostics: Diagnostics,
}

/// Raised when the cancellation token fires mid-walk. Carries whatever the
/// enclosing nodes had already diagnosed.
#[derive(Debug)]
pub(crate) struct Interrupted {
    pub path: AttributePath,
    pub reason: CancelReason,
    pub diagnostics: Diagnostics,
}

impl Interrupted {
    /// Put `earlier` in front of the diagnostics gathered so far.
    pub fn after(mut self, mut earlier: Diagnostics) -> Self {
        earlier.extend(self.diagnostics);
        self.diagnostics = earlier;
        self
    }
}

/// Per-walk state. Created fresh by every [`Walker::walk`] call.
pub(crate) struct Traversal<'a> {
    registry: &'a RuleRegistry,
    config: &'a WalkConfig,
    cancel: &'a CancelToken,
    pub stats: WalkStats,
}

impl<'a> Traversal<'a> {
    fn new(registry: &'a RuleRegistry, config: &'a WalkConfig, cancel: &'a CancelToken) -> Self {
        Self {
            registry,
            config,
            cancel,
            stats: WalkStats::default(),
        }
    }

    pub fn registry(&self) -> &'a RuleRegistry {
        self.registry
    }

    fn check_cancelled(&self, path: &AttributePath) -> Result<(), Interrupted> {
        match self.cancel.reason() {
            Some(reason) => Err(Interrupted {
                path: path.clone(),
                reason,
                diagnostics: Diagnostics::new(),
            }),
            None => Ok(()),
        }
    }

    fn transition(path: &AttributePath, state: NodeState) {
        trace!(path = %path, state = %state, "node state");
    }

    /// Resolve one prior/proposed pair.
    pub fn visit(
        &mut self,
        path: &AttributePath,
        prior: &TypedValue,
        proposed: &TypedValue,
    ) -> Result<Resolved, Interrupted> {
        self.check_cancelled(path)?;
        self.stats.nodes_visited += 1;
        Self::transition(path, NodeState::Unvisited);

        if prior.type_id() != proposed.type_id() {
            self.stats.type_mismatches += 1;
            Self::transition(path, NodeState::Unsupported);
            return Ok(Resolved::take(proposed));
        }
        Self::transition(path, NodeState::TypeChecked);

        if path.depth() > self.config.max_depth {
            Self::transition(path, NodeState::Unsupported);
            let diag = Diagnostic::error(
                "Maximum nesting depth exceeded",
                format!(
                    "value nested {} levels deep exceeds the limit of {}; using the proposed value",
                    path.depth(),
                    self.config.max_depth
                ),
            )
            .at(path.clone());
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(diag);
            return Ok(Resolved::take(proposed).with_diagnostics(diagnostics));
        }

        // Null and unknown never reach a rule.
        if !prior.is_concrete() || !proposed.is_concrete() {
            let keep = (prior.is_null() && proposed.is_null())
                || (prior.is_unknown() && proposed.is_unknown());
            Self::transition(path, if keep { NodeState::Equal } else { NodeState::NotEqual });
            return Ok(Resolved::decide(keep, prior, proposed));
        }

        let resolved = match prior.family() {
            TypeFamily::Bool | TypeFamily::Int | TypeFamily::Float | TypeFamily::String => {
                policy::scalar::compare(self, path, prior, proposed)?
            }
            family => {
                let composed = match family {
                    TypeFamily::Sequence => policy::sequence::compare(self, path, prior, proposed)?,
                    TypeFamily::Map => policy::map::compare(self, path, prior, proposed)?,
                    TypeFamily::Set => policy::set::compare(self, path, prior, proposed)?,
                    _ => policy::object::compare(self, path, prior, proposed)?,
                };
                Self::transition(path, NodeState::ChildrenVisited);
                let aggregated = self.apply_aggregate_rule(path, prior, composed)?;
                Self::transition(path, NodeState::Aggregated);
                aggregated
            }
        };

        Self::transition(path, NodeState::Terminal);
        Ok(resolved)
    }

    /// Give an aggregate type's own rule a chance to accept a composed value
    /// the built-in policy judged different.
    fn apply_aggregate_rule(
        &mut self,
        path: &AttributePath,
        prior: &TypedValue,
        composed: Resolved,
    ) -> Result<Resolved, Interrupted> {
        if composed.keep_prior || composed.diagnostics.has_error() {
            return Ok(composed);
        }
        let Some(rule) = self.registry().resolve(prior.type_id()) else {
            return Ok(composed);
        };

        let verdict = match self.invoke_rule(rule, path, prior, &composed.merged) {
            Ok(verdict) => verdict,
            Err(interrupted) => return Err(interrupted.after(composed.diagnostics)),
        };
        if verdict.keep_prior {
            return Ok(Resolved::keep(prior)
                .with_diagnostics(composed.diagnostics)
                .with_diagnostics(verdict.diagnostics));
        }
        Ok(composed.with_diagnostics(verdict.diagnostics))
    }

    /// Call a custom rule, isolating its failures to this node.
    ///
    /// Returned errors and panics become `Error` diagnostics. Any `Error`
    /// diagnostic forces `keep_prior = false`.
    pub fn invoke_rule(
        &mut self,
        rule: &dyn EqualityRule,
        path: &AttributePath,
        prior: &TypedValue,
        proposed: &TypedValue,
    ) -> Result<RuleVerdict, Interrupted> {
        self.check_cancelled(path)?;
        self.stats.rule_invocations += 1;
        Self::transition(path, NodeState::RuleInvoked);

        let mut diagnostics = Diagnostics::new();
        if self.config.trace_rule_calls {
            diagnostics.push(
                Diagnostic::trace(
                    "Calling provider defined type-based semantic equality",
                    format!("rule={} type={}", rule.name(), proposed.type_id()),
                )
                .at(path.clone()),
            );
        }

        let request = EqualityRequest::new(path, prior, proposed).with_cancellation(self.cancel);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.semantic_equals(&request)));

        let mut keep_prior = match outcome {
            Ok(Ok(response)) => {
                let mut emitted = response.diagnostics;
                emitted.tag_all(path);
                diagnostics.extend(emitted);
                response.keep_prior
            }
            Ok(Err(err)) => {
                self.stats.rule_failures += 1;
                warn!(path = %path, rule = rule.name(), error = %err, "equality rule failed");
                diagnostics.push(
                    Diagnostic::error("Semantic equality check failed", err.to_string())
                        .at(path.clone()),
                );
                false
            }
            Err(payload) => {
                self.stats.rule_failures += 1;
                let message = panic_message(payload.as_ref());
                warn!(path = %path, rule = rule.name(), panic = %message, "equality rule panicked");
                diagnostics.push(
                    Diagnostic::error(
                        "Semantic equality check panicked",
                        format!("rule '{}' panicked: {message}", rule.name()),
                    )
                    .at(path.clone()),
                );
                false
            }
        };

        if self.config.trace_rule_calls {
            diagnostics.push(
                Diagnostic::trace(
                    "Called provider defined type-based semantic equality",
                    format!("rule={} type={}", rule.name(), proposed.type_id()),
                )
                .at(path.clone()),
            );
        }

        if keep_prior && diagnostics.has_error() {
            debug!(path = %path, rule = rule.name(), "rule error overrides keep-prior verdict");
            keep_prior = false;
        }
        Self::transition(path, if keep_prior { NodeState::Equal } else { NodeState::NotEqual });

        Ok(RuleVerdict {
            keep_prior,
            diagnostics,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
