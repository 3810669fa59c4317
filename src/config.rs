//! Annealer tuning knobs, overridable from a TOML file.

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnealConfig {
    /// Starting temperature.
    pub t_initial: f64,
    /// Multiplier applied to the temperature after every round.
    pub cooling: f64,
    /// The per-round uphill cap is `moves_per_block * n_blocks`; the total
    /// move cap is twice that.
    pub moves_per_block: usize,
    /// Stop once a round rejects more than this share of its proposals.
    pub reject_ratio_limit: f64,
    /// Wall-clock budget for the whole search, in seconds from start.
    pub abort_deadline_secs: u64,
    /// Wall-clock budget for the shuffle seeding phase, in seconds from
    /// start.
    pub shuffle_deadline_secs: u64,
    /// Iteration cap for the shuffle seeding phase.
    pub shuffle_cap: usize,
    /// A shuffled start is only adopted while its area stays below this
    /// multiple of the outline area.
    pub shuffle_area_factor: f64,
    /// Replace the swapped-limit area penalty with the clamped product.
    pub strict_area_cost: bool,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        AnnealConfig {
            t_initial: 200.0,
            cooling: 0.98,
            moves_per_block: 50,
            reject_ratio_limit: 0.99,
            abort_deadline_secs: 295,
            shuffle_deadline_secs: 150,
            shuffle_cap: 50_000,
            shuffle_area_factor: 3.5,
            strict_area_cost: false,
        }
    }
}

impl AnnealConfig {
    /// Reads a TOML overlay; fields missing from the file keep their
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }
}
