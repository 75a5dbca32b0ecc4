//! Configuration types for choosing a topology

use std::sync::Arc;

use lineage_core::Topology;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Burst, Chain, DelayedChain, DiscreteGenerational, Empty, FullyConnected, ScaleFree,
    SequentialMicrosociety, SplitSample, Star,
};

/// Errors from building a topology out of its configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyConfigError {
    #[error("{topology}: {reason}")]
    InvalidParameter {
        topology: &'static str,
        reason: String,
    },

    #[error("split-sample cannot wrap another split-sample")]
    NestedSplitSample,
}

/// Which wiring policy a network uses, with its parameters
///
/// Serialized internally tagged, e.g. `{"type": "scale-free", "m0": 4, "m": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TopologyConfig {
    Empty,
    Chain,
    DelayedChain,
    #[default]
    FullyConnected,
    Star,
    Burst,
    ScaleFree {
        m0: usize,
        m: usize,
    },
    DiscreteGenerational {
        generations: usize,
        generation_size: usize,
        #[serde(default)]
        initial_source: bool,
    },
    Microsociety {
        n: usize,
    },
    SplitSample {
        inner: Box<TopologyConfig>,
    },
}

impl TopologyConfig {
    /// Tag the built topology will report as its kind
    pub fn kind(&self) -> &'static str {
        match self {
            TopologyConfig::Empty => "empty",
            TopologyConfig::Chain => "chain",
            TopologyConfig::DelayedChain => "delayed-chain",
            TopologyConfig::FullyConnected => "fully-connected",
            TopologyConfig::Star => "star",
            TopologyConfig::Burst => "burst",
            TopologyConfig::ScaleFree { .. } => "scale-free",
            TopologyConfig::DiscreteGenerational { .. } => "discrete-generational",
            TopologyConfig::Microsociety { .. } => "microsociety",
            TopologyConfig::SplitSample { .. } => "split-sample",
        }
    }

    /// Validate parameters and build the topology to inject at network creation
    pub fn build(&self) -> Result<Arc<dyn Topology>, TopologyConfigError> {
        let invalid = |reason: &str| TopologyConfigError::InvalidParameter {
            topology: self.kind(),
            reason: reason.to_string(),
        };

        let topology: Arc<dyn Topology> = match self {
            TopologyConfig::Empty => Arc::new(Empty),
            TopologyConfig::Chain => Arc::new(Chain),
            TopologyConfig::DelayedChain => Arc::new(DelayedChain),
            TopologyConfig::FullyConnected => Arc::new(FullyConnected),
            TopologyConfig::Star => Arc::new(Star),
            TopologyConfig::Burst => Arc::new(Burst),
            TopologyConfig::ScaleFree { m0, m } => {
                if *m == 0 {
                    return Err(invalid("m must be at least 1"));
                }
                if *m0 < *m {
                    return Err(invalid("the core m0 must be at least m"));
                }
                Arc::new(ScaleFree::new(*m0, *m))
            }
            TopologyConfig::DiscreteGenerational {
                generations,
                generation_size,
                initial_source,
            } => {
                if *generation_size == 0 {
                    return Err(invalid("generation_size must be at least 1"));
                }
                Arc::new(DiscreteGenerational::new(
                    *generations,
                    *generation_size,
                    *initial_source,
                ))
            }
            TopologyConfig::Microsociety { n } => {
                if *n == 0 {
                    return Err(invalid("n must be at least 1"));
                }
                Arc::new(SequentialMicrosociety::new(*n))
            }
            TopologyConfig::SplitSample { inner } => {
                if matches!(**inner, TopologyConfig::SplitSample { .. }) {
                    return Err(TopologyConfigError::NestedSplitSample);
                }
                Arc::new(SplitSample::new(inner.build()?))
            }
        };
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tagged_json() {
        let config: TopologyConfig =
            serde_json::from_str(r#"{"type": "scale-free", "m0": 4, "m": 2}"#).unwrap();
        assert_eq!(config, TopologyConfig::ScaleFree { m0: 4, m: 2 });

        let config: TopologyConfig = serde_json::from_str(
            r#"{"type": "discrete-generational", "generations": 3, "generation_size": 5}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            TopologyConfig::DiscreteGenerational {
                generations: 3,
                generation_size: 5,
                initial_source: false
            }
        );
    }

    #[test]
    fn test_split_sample_wraps_its_inner_config() {
        let json = r#"{"type": "split-sample", "inner": {"type": "chain"}}"#;
        let config: TopologyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            TopologyConfig::SplitSample {
                inner: Box::new(TopologyConfig::Chain)
            }
        );
        assert_eq!(config.build().unwrap().kind(), "split-sample");
    }

    #[test]
    fn test_built_kind_matches_config_kind() {
        let configs = [
            TopologyConfig::Empty,
            TopologyConfig::Chain,
            TopologyConfig::DelayedChain,
            TopologyConfig::FullyConnected,
            TopologyConfig::Star,
            TopologyConfig::Burst,
            TopologyConfig::ScaleFree { m0: 4, m: 4 },
            TopologyConfig::DiscreteGenerational {
                generations: 2,
                generation_size: 2,
                initial_source: true,
            },
            TopologyConfig::Microsociety { n: 3 },
        ];
        for config in configs {
            assert_eq!(config.build().unwrap().kind(), config.kind());
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            TopologyConfig::ScaleFree { m0: 2, m: 3 }.build(),
            Err(TopologyConfigError::InvalidParameter { topology: "scale-free", .. })
        ));
        assert!(TopologyConfig::Microsociety { n: 0 }.build().is_err());
        assert!(TopologyConfig::DiscreteGenerational {
            generations: 1,
            generation_size: 0,
            initial_source: false
        }
        .build()
        .is_err());

        let nested = TopologyConfig::SplitSample {
            inner: Box::new(TopologyConfig::SplitSample {
                inner: Box::new(TopologyConfig::Star),
            }),
        };
        assert_eq!(nested.build().unwrap_err(), TopologyConfigError::NestedSplitSample);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<TopologyConfig>(r#"{"type": "ring"}"#).is_err());
    }
}
