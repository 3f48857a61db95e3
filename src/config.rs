use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// When the neighbor catalog is rebuilt.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RebuildPolicy {
    /// Every `neighbor_rebuild_interval` collisions.
    #[default]
    Interval,
    /// As soon as any particle has moved half the safety margin.
    Displacement,
}

/// Engine settings, fixed at construction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub neighbor_rebuild_interval: u64,
    /// Skin `delta` added to the interaction range.
    pub neighbor_safety_margin: f64,
    /// Step budget for the runner; `None` runs until halted.
    pub max_steps: Option<u64>,
    pub neighbor_rebuild_policy: RebuildPolicy,
    /// Compare against an all-pairs scan after every rebuild.
    pub verify_neighbors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neighbor_rebuild_interval: 20,
            neighbor_safety_margin: 0.5,
            max_steps: None,
            neighbor_rebuild_policy: RebuildPolicy::Interval,
            verify_neighbors: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbor_rebuild_interval == 0 {
            return Err(Error::InvalidParam("neighbor_rebuild_interval must be > 0".into()));
        }
        if !self.neighbor_safety_margin.is_finite() || self.neighbor_safety_margin <= 0.0 {
            return Err(Error::InvalidParam(
                "neighbor_safety_margin must be finite and > 0".into(),
            ));
        }
        Ok(())
    }
}
