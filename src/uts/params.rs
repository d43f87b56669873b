//! Tree-shape and run parameters, replicated read-only to every worker.

use serde::{Deserialize, Serialize};

use crate::error::UtsError;

pub const MAX_NUM_CHILDREN: u32 = 100;
pub const MAX_SPAWN_GRANULARITY: usize = 500;

/// `MAX_LOCAL = chunk_size^2`, the per-worker local-queue spill threshold.
pub fn max_local(chunk_size: usize) -> usize {
    chunk_size.saturating_mul(chunk_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i64)]
pub enum TreeType {
    Binomial = 0,
    Geometric = 1,
    Hybrid = 2,
    Balanced = 3,
}

impl TryFrom<i64> for TreeType {
    type Error = UtsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Binomial),
            1 => Ok(Self::Geometric),
            2 => Ok(Self::Hybrid),
            3 => Ok(Self::Balanced),
            other => Err(UtsError::UnknownTreeType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i64)]
pub enum GeoShape {
    Linear = 0,
    ExpDec = 1,
    Cyclic = 2,
    Fixed = 3,
}

impl TryFrom<i64> for GeoShape {
    type Error = UtsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Linear),
            1 => Ok(Self::ExpDec),
            2 => Ok(Self::Cyclic),
            3 => Ok(Self::Fixed),
            other => Err(UtsError::UnknownGeoShape(other)),
        }
    }
}

/// Immutable, `Clone`-cheap (all scalar) run configuration shared by every
/// worker in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub tree_type: TreeType,
    pub root_branching_factor: f64,
    pub root_seed: u64,
    pub shape_fn: GeoShape,
    pub gen_mx: u32,
    pub non_leaf_prob: f64,
    pub non_leaf_bf: u32,
    /// Fraction of `gen_mx` at which a HYBRID tree switches from GEO to
    /// BIN. EXPDEC and CYCLIC derive their own decay/cycle length from
    /// `b_0` and `gen_mx` directly and don't read this field.
    pub shift_depth: f64,
    pub compute_granularity: u32,
    pub chunk_size: usize,
    pub polling_interval_ms: u64,
    pub overcommit_factor: f64,
    pub verbose: u8,
    pub debug: u32,
}

impl Params {
    pub fn max_local(&self) -> usize {
        max_local(self.chunk_size)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.chunk_size == 0 {
            return Err(UtsError::invalid_params("chunk_size must be > 0"));
        }
        if self.overcommit_factor < 1.0 {
            return Err(UtsError::invalid_params("overcommit_factor must be >= 1.0"));
        }
        if self.root_branching_factor < 0.0 {
            return Err(UtsError::invalid_params("root_branching_factor must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.non_leaf_prob) {
            return Err(UtsError::invalid_params("non_leaf_probability must be in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_local_is_chunk_size_squared() {
        assert_eq!(max_local(4), 16);
        assert_eq!(max_local(20), 400);
    }

    #[test]
    fn tree_type_round_trips_through_its_code() {
        for code in 0..4 {
            let t = TreeType::try_from(code).unwrap();
            assert_eq!(t as i64, code);
        }
        assert!(TreeType::try_from(4).is_err());
    }

    #[test]
    fn geo_shape_round_trips_through_its_code() {
        for code in 0..4 {
            let s = GeoShape::try_from(code).unwrap();
            assert_eq!(s as i64, code);
        }
        assert!(GeoShape::try_from(-1).is_err());
    }
}
