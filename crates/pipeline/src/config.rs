//! Pipeline configuration, loadable from YAML.
//!
//! The detection score threshold deliberately has no default: deployments
//! have been observed running anywhere from a strict 0.7 to a loose 0.05,
//! so the value must be stated explicitly in configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Tick cadence and model parameters for one pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between timer ticks (e.g. 0.5 - 1.0)
    pub interval_secs: f64,

    /// Minimum face probability for a detection to be reported; required,
    /// no default
    pub detection_threshold: f32,

    /// Display pixel dimensions for UI-coordinate mapping, if a display
    /// consumer is attached
    #[serde(default)]
    pub display_size: Option<(f32, f32)>,
}

impl PipelineConfig {
    /// Tick period as a [`Duration`]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}
