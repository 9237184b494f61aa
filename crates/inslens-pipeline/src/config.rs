//! Pipeline configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sizes of the synthesized top-N insurers (default: 5, 10, 20)
    pub top_n_thresholds: Vec<u32>,
    /// Clip bound for `base_change` (default: 100.0)
    pub max_base_change: f64,
    /// Clip bound for `market_share_change`, in percentage points (default: 100.0)
    pub max_market_share_change: f64,
    /// `|base_change|` above which the infinity marker is shown (default: 10.0)
    pub base_infinity_threshold: f64,
    /// `|market_share_change|` above which the infinity marker is shown (default: 100.0)
    pub market_share_infinity_threshold: f64,
    /// Infinity marker (default: "∞")
    pub infinity_sign: String,
    /// Smallest previous value treated as a valid growth base (default: 1e-9)
    pub growth_epsilon: f64,
    /// History a rolling-year value needs to be kept, in days (default: 364)
    pub mat_min_history_days: i64,
    /// Maximum number of segments produced by the splitter (default: 5)
    pub max_segments: usize,
    /// Separator of pivot-key parts (default: "&")
    pub separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n_thresholds: vec![5, 10, 20],
            max_base_change: 100.0,
            max_market_share_change: 100.0,
            base_infinity_threshold: 10.0,
            market_share_infinity_threshold: 100.0,
            infinity_sign: "∞".to_string(),
            growth_epsilon: 1e-9,
            mat_min_history_days: 364,
            max_segments: 5,
            separator: "&".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"max_segments": 3, "top_n_thresholds": [3]}"#).unwrap();
        assert_eq!(config.max_segments, 3);
        assert_eq!(config.top_n_thresholds, vec![3]);
        assert_eq!(config.mat_min_history_days, 364);
        assert_eq!(config.infinity_sign, "∞");
    }
}
