use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WalkError, WalkResult};

/// Configuration for a [`crate::Walker`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Emit `Trace` diagnostics before and after every custom rule call.
    pub trace_rule_calls: bool,
    /// Nodes nested deeper than this resolve to the proposed value with an
    /// `Error` diagnostic instead of being compared.
    pub max_depth: usize,
    /// Maximum wall-clock time for one walk, measured from its start.
    pub deadline: Option<Duration>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            trace_rule_calls: false,
            max_depth: 64,
            deadline: None,
        }
    }
}

impl WalkConfig {
    /// Default configuration with rule-call tracing switched on.
    pub fn traced() -> Self {
        Self {
            trace_rule_calls: true,
            ..Default::default()
        }
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> WalkResult<Self> {
        toml::from_str(s).map_err(|e| WalkError::Config(e.to_string()))
    }
}
