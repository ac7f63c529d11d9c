//! Bridge configuration.
//!
//! The only tunable today is the [`CostModel`] used to rank overloads. A
//! config can be loaded from TOML:
//!
//! ```toml
//! [costs]
//! widening = 10
//! boxing = 100
//! object_match = "exact"
//! ```
//!
//! Missing keys fall back to the defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a TOML config file for [`BridgeConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "INVOKE_BRIDGE_CONFIG";

// =============================================================================
// Ranking Cost Defaults
// =============================================================================
//
// Per-parameter conversion costs, cheapest first:
//
//   exact (0) < widening < boxing < assignability < narrowing
//
// Widening and assignability grow by a small step per rank / hierarchy level,
// so the nearest conversion wins inside a tier. The gaps between tier bases
// must stay larger than the largest step sum of the tier below
// (see `CostModel::validate`).

const DEFAULT_WIDENING: u64 = 10;
const DEFAULT_WIDENING_STEP: u64 = 1;
const DEFAULT_BOXING: u64 = 100;
const DEFAULT_ASSIGNABILITY: u64 = 1_000;
const DEFAULT_ASSIGNABILITY_STEP: u64 = 1;
const DEFAULT_NARROWING: u64 = 10_000;

/// Largest rank distance on the numeric ladder (`i8` to `BigInt`).
const MAX_RANK_DISTANCE: u64 = 6;

/// How values passed to an `Object` parameter are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectMatch {
    /// `Object` is the loosest match: assignability cost by hierarchy depth.
    #[default]
    Assignable,
    /// Any value matches `Object` exactly (cost 0).
    Exact,
}

/// Conversion costs used by the candidate ranker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Base cost of a numeric widening conversion
    pub widening: u64,
    /// Added per rank between source and target
    pub widening_step: u64,
    /// Cost of wrapping a primitive into its nullable form
    pub boxing: u64,
    /// Base cost of passing a value as one of its supertypes
    pub assignability: u64,
    /// Added per hierarchy level
    pub assignability_step: u64,
    /// Cost of a range-checked narrowing conversion
    pub narrowing: u64,
    pub object_match: ObjectMatch,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            widening: DEFAULT_WIDENING,
            widening_step: DEFAULT_WIDENING_STEP,
            boxing: DEFAULT_BOXING,
            assignability: DEFAULT_ASSIGNABILITY,
            assignability_step: DEFAULT_ASSIGNABILITY_STEP,
            narrowing: DEFAULT_NARROWING,
            object_match: ObjectMatch::Assignable,
        }
    }
}

impl CostModel {
    /// Check that the tiers keep their order:
    /// exact < widening < boxing < assignability < narrowing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let widest_widening = self
            .widening
            .saturating_add(self.widening_step.saturating_mul(MAX_RANK_DISTANCE));

        if self.widening == 0 {
            return Err(ConfigError::cost_ordering("exact", "widening"));
        }
        if widest_widening >= self.boxing {
            return Err(ConfigError::cost_ordering("widening", "boxing"));
        }
        if self.boxing.saturating_add(widest_widening) >= self.assignability {
            return Err(ConfigError::cost_ordering("boxing", "assignability"));
        }
        if self.assignability >= self.narrowing {
            return Err(ConfigError::cost_ordering("assignability", "narrowing"));
        }
        Ok(())
    }

    /// Cost of moving between two ranks of the numeric ladder.
    pub fn numeric_cost(&self, from_rank: u8, to_rank: u8) -> u64 {
        match to_rank.cmp(&from_rank) {
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => {
                let steps = u64::from(to_rank - from_rank);
                self.widening
                    .saturating_add(self.widening_step.saturating_mul(steps))
            }
            std::cmp::Ordering::Less => self.narrowing,
        }
    }

    /// Cost of passing a value as a supertype `depth` levels up.
    pub fn assignability_cost(&self, depth: u64) -> u64 {
        self.assignability
            .saturating_add(self.assignability_step.saturating_mul(depth))
    }

    /// Cost of passing a value to an `Object` parameter, `depth` levels up.
    pub fn object_cost(&self, depth: u64) -> u64 {
        match self.object_match {
            ObjectMatch::Exact => 0,
            ObjectMatch::Assignable => self.assignability_cost(depth),
        }
    }

    /// Cost of passing null to a nullable parameter of the given generality.
    pub fn null_cost(&self, generality: u64, is_object: bool) -> u64 {
        if is_object && self.object_match == ObjectMatch::Exact {
            return 0;
        }
        self.assignability_step.saturating_mul(generality)
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub costs: CostModel,
}

impl BridgeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(source)?;
        config.costs.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Load the file named by `INVOKE_BRIDGE_CONFIG`, or the defaults when the
    /// variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_path(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }
}

/// Errors raised while loading a [`BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read bridge config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bridge config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cost tiers out of order: {lower} must be cheaper than {higher}")]
    CostOrdering {
        lower: &'static str,
        higher: &'static str,
    },
}

impl ConfigError {
    fn cost_ordering(lower: &'static str, higher: &'static str) -> Self {
        ConfigError::CostOrdering { lower, higher }
    }
}
