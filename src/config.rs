use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::Rgba;
use crate::period::PeriodLimitPolicy;
use crate::playback::DEFAULT_TIMESTEP_MS;

/// Tunables of an interactive session. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub period_limit: PeriodLimitPolicy,
    /// Color of destination cells that no source cell maps to.
    pub fill: Rgba,
    pub timestep_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            period_limit: PeriodLimitPolicy::default(),
            fill: Rgba::TRANSPARENT,
            timestep_ms: DEFAULT_TIMESTEP_MS,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
