//! Realm configuration.

use serde::{Deserialize, Serialize};

use crate::error::FacadeError;
use crate::object_model::DEFAULT_MAX_CHAIN_DEPTH;

/// How the strict get trap produces a value once it intercepts a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Presence test over the target's chain, then an ordinary get.
    #[default]
    Reflective,
    /// Walk the chain with the descriptor resolver; the presence test only
    /// runs when the resolver finds nothing readable.
    ChainWalk,
}

/// Configuration controlling a [`crate::realm::Realm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    /// Stamped on every recorded event.
    pub trace_id: String,
    pub resolution_policy: ResolutionPolicy,
    /// Chain walks deeper than this fail with `PrototypeChainTooDeep`.
    pub max_chain_depth: u32,
    pub record_events: bool,
    /// Oldest events are dropped once the log holds this many.
    pub event_capacity: usize,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            trace_id: "strict-facade".to_string(),
            resolution_policy: ResolutionPolicy::Reflective,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            record_events: true,
            event_capacity: 4096,
        }
    }
}

impl RealmConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FacadeError> {
        let config: Self = serde_json::from_str(json).map_err(|e| FacadeError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FacadeError> {
        if self.trace_id.trim().is_empty() {
            return Err(FacadeError::InvalidConfig {
                reason: "trace_id must not be empty".to_string(),
            });
        }
        if self.max_chain_depth == 0 {
            return Err(FacadeError::InvalidConfig {
                reason: "max_chain_depth must be at least 1".to_string(),
            });
        }
        if self.record_events && self.event_capacity == 0 {
            return Err(FacadeError::InvalidConfig {
                reason: "event_capacity must be non-zero when events are recorded".to_string(),
            });
        }
        Ok(())
    }
}
