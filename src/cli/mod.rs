//! Command-line interface for the `uts` binary.
//!
//! Flags map onto [`crate::uts::Params`] field-for-field; there is no
//! config file and no environment-variable layer, every tuning knob is a
//! CLI flag, read once at startup.

use clap::Parser;

use crate::error::UtsError;
use crate::uts::{GeoShape, Params, TreeType};

/// Unbalanced Tree Search: count the nodes of a deterministic pseudo-random
/// tree in parallel, using a hierarchical work-stealing scheduler.
#[derive(Parser, Debug, Clone)]
#[command(name = "uts", author, version, about, propagate_version = true)]
pub struct Cli {
    /// Tree type: 0=BIN, 1=GEO, 2=HYBRID, 3=BALANCED.
    #[arg(long = "tree-type", default_value_t = 3)]
    pub tree_type: i64,

    /// Root branching factor (`b_0`).
    #[arg(long = "root-branching-factor", default_value_t = 4.0)]
    pub root_branching_factor: f64,

    /// Seed for the root node's RNG state.
    #[arg(long = "root-seed", default_value_t = 0)]
    pub root_seed: u64,

    /// Geometric shape function: 0=LINEAR, 1=EXPDEC, 2=CYCLIC, 3=FIXED.
    #[arg(long = "tree-shape", default_value_t = 0)]
    pub tree_shape: i64,

    /// Maximum tree depth (`gen_mx`).
    #[arg(long = "tree-depth", default_value_t = 10)]
    pub tree_depth: u32,

    /// Probability a BIN non-root node is non-leaf.
    #[arg(long = "non-leaf-probability", default_value_t = 15.0 / 64.0)]
    pub non_leaf_probability: f64,

    /// Branching factor of a non-leaf BIN non-root node (`non_leaf_bf`).
    #[arg(long = "num-children", default_value_t = 4)]
    pub num_children: u32,

    /// Fraction of `gen_mx` at which HYBRID switches GEO->BIN. EXPDEC and
    /// CYCLIC derive their own decay/cycle length from `b_0` and `gen_mx`
    /// directly and ignore this flag.
    #[arg(long = "fraction-of-depth", default_value_t = 0.5)]
    pub fraction_of_depth: f64,

    /// Number of RNG remix steps charged per generated child.
    #[arg(long = "compute-granularity", default_value_t = 1)]
    pub compute_granularity: u32,

    /// Transfer unit size between queues; also sets `MAX_LOCAL = chunk_size^2`.
    #[arg(long = "chunk-size", default_value_t = 20)]
    pub chunk_size: usize,

    /// Work stealing/sharing interval, in milliseconds. Parsed and carried
    /// in `Params` for parity with the original CLI surface; this crate's
    /// steal protocol is reactive (triggered by an empty local queue, not
    /// by a timer), so the value is not read anywhere.
    #[arg(long = "interval", default_value_t = 1)]
    pub interval: u64,

    /// Workers per OS thread (>= 1.0).
    #[arg(long = "overcommit-factor", default_value_t = 1.0)]
    pub overcommit_factor: f64,

    /// Verbosity: 0 (CSV only), 1 (human-readable), 2 (+ parameter dump).
    #[arg(long = "verbose", default_value_t = 1)]
    pub verbose: u8,

    /// Debug level, forwarded into per-worker trace spans.
    #[arg(long = "debug", default_value_t = 0)]
    pub debug: u32,

    /// Number of simulated hosts the fleet is partitioned across.
    #[arg(long = "num-hosts", default_value_t = 1)]
    pub num_hosts: usize,

    /// Total worker count. Overrides `os_threads * overcommit_factor`
    /// when set.
    #[arg(long = "workers")]
    pub workers: Option<usize>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_params(&self) -> crate::Result<Params> {
        let params = Params {
            tree_type: TreeType::try_from(self.tree_type)?,
            root_branching_factor: self.root_branching_factor,
            root_seed: self.root_seed,
            shape_fn: GeoShape::try_from(self.tree_shape)?,
            gen_mx: self.tree_depth,
            non_leaf_prob: self.non_leaf_probability,
            non_leaf_bf: self.num_children,
            shift_depth: self.fraction_of_depth,
            compute_granularity: self.compute_granularity,
            chunk_size: self.chunk_size,
            polling_interval_ms: self.interval,
            overcommit_factor: self.overcommit_factor,
            verbose: self.verbose,
            debug: self.debug,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose.min(2)
    }

    pub fn is_csv(&self) -> bool {
        self.verbose == 0
    }
}

impl TryFrom<&Cli> for Params {
    type Error = UtsError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        cli.to_params()
    }
}
