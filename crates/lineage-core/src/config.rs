//! Graph configuration

use serde::{Deserialize, Serialize};

/// Default network capacity when a topology does not set one
pub const DEFAULT_MAX_SIZE: usize = 1_000_000;

/// Configuration for a [`Graph`](crate::Graph)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Seed for the graph's random number generator (None = OS entropy)
    pub seed: Option<u64>,
    /// Capacity given to new networks
    pub default_max_size: usize,
    /// Log a warning when a node is added to a network that is already full
    pub warn_when_full: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_max_size: DEFAULT_MAX_SIZE,
            warn_when_full: true,
        }
    }
}

impl GraphConfig {
    /// Configuration with a fixed seed, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::default().with_seed(seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_default_max_size(mut self, max_size: usize) -> Self {
        self.default_max_size = max_size;
        self
    }

    pub fn with_warn_when_full(mut self, warn: bool) -> Self {
        self.warn_when_full = warn;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.default_max_size, 1_000_000);
        assert!(config.warn_when_full);
    }

    #[test]
    fn test_partial_json() {
        let config: GraphConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config, GraphConfig::seeded(7));
    }
}
