use std::fmt;
use std::time::Duration;

use semeq_types::{Diagnostics, TypedValue};
use serde::{Deserialize, Serialize};

/// Result of a completed walk.
#[derive(Clone, Debug)]
pub struct WalkOutcome {
    /// The merged tree, composed node by node from prior or proposed.
    pub merged: TypedValue,
    /// Whether the root resolved to its prior representation. For objects
    /// this is the AND over all attributes and is informational only.
    pub keep_prior: bool,
    /// Every diagnostic raised during the walk, in visiting order.
    pub diagnostics: Diagnostics,
    /// Counters describing the work done.
    pub stats: WalkStats,
}

impl WalkOutcome {
    /// Inverse of `keep_prior`.
    pub fn changed(&self) -> bool {
        !self.keep_prior
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}

/// Counters collected during one walk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Nodes visited, including trial comparisons made while matching sets.
    pub nodes_visited: usize,
    /// Custom rules invoked.
    pub rule_invocations: usize,
    /// Rule calls that returned an error or panicked.
    pub rule_failures: usize,
    /// Pairs whose declared types differed.
    pub type_mismatches: usize,
    /// Prior/proposed set member pairs compared semantically.
    pub set_candidates_compared: usize,
    /// Wall-clock time of the walk.
    pub elapsed: Duration,
}

/// Per-node progress, reported at `trace` level.
///
/// Scalars move `Unvisited -> TypeChecked -> (Unsupported | RuleInvoked ->
/// Equal | NotEqual) -> Terminal`; aggregates pass through
/// `ChildrenVisited -> Aggregated` instead of the rule states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Unvisited,
    TypeChecked,
    Unsupported,
    RuleInvoked,
    Equal,
    NotEqual,
    ChildrenVisited,
    Aggregated,
    Terminal,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
