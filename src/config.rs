//! Session configuration, persisted as TOML.
//!
//! ```toml
//! max_block_size = 3
//! selection = "fifo"
//! seed = 7
//! uncertain = "retry"
//! search = "breadth"
//!
//! [[block_caps]]
//! size = 2
//! max_queries = 50
//!
//! [[block_caps]]
//! size = 3
//! max_queries = 0   # skip this block
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::manager::Selection;
use crate::states::SearchStrategy;

/// What to do when the expert is unsure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertainPolicy {
    /// Keep the query active and ask it again.
    #[default]
    Retry,
    /// Record the query as answered without an answer and move on.
    Skip,
}

/// Per-block sampling cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCap {
    /// Antecedent size this cap applies to.
    pub size: usize,
    /// Maximum candidates kept; `0` drops the block.
    pub max_queries: usize,
}

/// Parameters of one questioning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Largest antecedent size to generate.
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,
    /// Order in which active queries are asked.
    #[serde(default)]
    pub selection: Selection,
    /// Seed for generation and random selection. Unset means entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub uncertain: UncertainPolicy,
    /// State enumeration strategy for reports.
    #[serde(default)]
    pub search: SearchStrategy,
    /// Caps per antecedent size; blocks without a cap are kept whole.
    #[serde(default)]
    pub block_caps: Vec<BlockCap>,
}

fn default_max_block_size() -> usize {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_block_size: default_max_block_size(),
            selection: Selection::default(),
            seed: None,
            uncertain: UncertainPolicy::default(),
            search: SearchStrategy::default(),
            block_caps: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Caps as a size → limit map. Later entries win on duplicate sizes.
    pub fn caps(&self) -> BTreeMap<usize, usize> {
        self.block_caps
            .iter()
            .map(|cap| (cap.size, cap.max_queries))
            .collect()
    }

    /// RNG for generation and selection.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_block_size == 0 {
            return Err(ConfigError::Invalid {
                message: "max_block_size must be at least 1".into(),
            });
        }
        if let Some(cap) = self.block_caps.iter().find(|c| c.size == 0) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "block cap for size 0 (max_queries = {}) has no matching block",
                    cap.max_queries
                ),
            });
        }
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
