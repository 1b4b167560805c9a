// mulerift/src/config.rs
//
// Ring engine tuning. Defaults reproduce the production scoring rule:
//   ring score = mean(member base scores) + 25 per multi-cycle member, cap 100
// and the RING_001 id format.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RingError};

pub const BONUS_PER_OVERLAP: f64   = 25.0;
pub const SCORE_CAP:         f64   = 100.0;
pub const ID_PREFIX:         &str  = "RING";
pub const ID_WIDTH:          usize = 3;

// Wider ids would not fit the 64-bit ring counter check in `max_rings`.
const MAX_ID_WIDTH: usize = 18;

/// Which raw groups count towards an account's multiplicity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BonusScope {
    /// Only raw cycle groups. An account must recur across distinct cycles.
    #[default]
    CycleOnly,
    /// Raw groups of any kind.
    AnyPattern,
}

/// How overlapping raw groups are found before union.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// account → group index, near-linear in total members.
    #[default]
    Indexed,
    /// Pairwise intersection over every group pair. Quadratic; audit use.
    OverlapGraph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub bonus_per_overlap: f64,
    pub score_cap:         f64,
    pub bonus_scope:       BonusScope,
    pub merge_strategy:    MergeStrategy,
    pub id_prefix:         String,
    pub id_width:          usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            bonus_per_overlap: BONUS_PER_OVERLAP,
            score_cap:         SCORE_CAP,
            bonus_scope:       BonusScope::default(),
            merge_strategy:    MergeStrategy::default(),
            id_prefix:         ID_PREFIX.to_string(),
            id_width:          ID_WIDTH,
        }
    }
}

impl RingConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| RingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bonus_per_overlap.is_finite() || self.bonus_per_overlap < 0.0 {
            return Err(RingError::InvalidConfig(format!(
                "bonus_per_overlap must be a non-negative number, got {}",
                self.bonus_per_overlap
            )));
        }
        if !self.score_cap.is_finite() || self.score_cap <= 0.0 {
            return Err(RingError::InvalidConfig(format!(
                "score_cap must be a positive number, got {}",
                self.score_cap
            )));
        }
        if self.id_prefix.trim().is_empty() {
            return Err(RingError::InvalidConfig("id_prefix must not be empty".into()));
        }
        if self.id_width == 0 || self.id_width > MAX_ID_WIDTH {
            return Err(RingError::InvalidConfig(format!(
                "id_width must be between 1 and {}, got {}",
                MAX_ID_WIDTH, self.id_width
            )));
        }
        Ok(())
    }

    /// Largest ring count the id format can number without widening.
    pub fn max_rings(&self) -> usize {
        let width = self.id_width.min(MAX_ID_WIDTH) as u32;
        (10u64.pow(width) - 1).try_into().unwrap_or(usize::MAX)
    }
}
