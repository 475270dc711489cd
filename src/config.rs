//! Validator configuration
//!
//! ```toml
//! check_turn_lanes_at_intersections = true
//! driving_side = "left"
//! enabled = ["turn_lanes", "link_chain"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::AnalyzerKind;
use roadcheck_common::{Error, Result};

/// Side of the road traffic keeps to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingSide {
    #[default]
    Right,
    Left,
}

impl DrivingSide {
    /// Restriction that forbids crossing oncoming traffic
    pub fn crossing_restriction(self) -> &'static str {
        match self {
            DrivingSide::Right => "no_right_turn",
            DrivingSide::Left => "no_left_turn",
        }
    }

    /// Existing restriction values that already settle a link turn
    pub fn settling_restrictions(self) -> [&'static str; 3] {
        match self {
            DrivingSide::Right => ["no_right_turn", "only_left_turn", "only_straight_on"],
            DrivingSide::Left => ["no_left_turn", "only_right_turn", "only_straight_on"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Run the lane continuity checks at intersections (3801, 3802, 3806)
    pub check_turn_lanes_at_intersections: bool,
    pub driving_side: DrivingSide,
    /// Analyzers to run
    pub enabled: Vec<AnalyzerKind>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_turn_lanes_at_intersections: false,
            driving_side: DrivingSide::Right,
            enabled: AnalyzerKind::ALL.to_vec(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded validator config");
        Ok(config)
    }

    pub fn is_enabled(&self, kind: AnalyzerKind) -> bool {
        self.enabled.contains(&kind)
    }
}
