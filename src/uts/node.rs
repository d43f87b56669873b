//! Tree node and shape engine.
//!
//! `num_children` is the only place randomness (besides the RNG derivation
//! itself) enters the system, and it is a pure function of `(node, params)`,
//! with no hidden global state and no wall-clock dependence.

use serde::{Deserialize, Serialize};

use super::params::{GeoShape, Params, TreeType, MAX_NUM_CHILDREN};
use super::rng::RngState;

/// A search-tree vertex. Values, copied freely, never shared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    pub tree_type: TreeType,
    pub height: u32,
    /// Filled in by `num_children` at expansion time; `-1` beforehand.
    pub num_children: i32,
    pub state: RngState,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.num_children == 0
    }
}

/// Seeds the root node from `params.root_seed`.
pub fn init_root(params: &Params) -> Node {
    Node {
        tree_type: effective_type_at(params, 0),
        height: 0,
        num_children: -1,
        state: RngState::seed(params.root_seed),
    }
}

/// The concrete type a node at `height` takes on, resolving HYBRID into a
/// concrete GEO or BIN choice.
fn effective_type_at(params: &Params, height: u32) -> TreeType {
    match params.tree_type {
        TreeType::Hybrid => {
            let threshold = (params.shift_depth * params.gen_mx as f64).round() as u32;
            if height < threshold {
                TreeType::Geometric
            } else {
                TreeType::Binomial
            }
        }
        other => other,
    }
}

/// The type a child one level below `node` would take on.
pub fn child_type(node: &Node, params: &Params) -> TreeType {
    effective_type_at(params, node.height + 1)
}

/// Computes (and caches, via the returned count) how many children `node`
/// has. Never mutates `node`; callers store the result themselves.
pub fn num_children(node: &Node, params: &Params) -> crate::Result<u32> {
    let raw = match node.tree_type {
        TreeType::Binomial => num_children_bin(node, params),
        TreeType::Geometric => num_children_geo(node, params),
        TreeType::Balanced => num_children_balanced(node, params),
        TreeType::Hybrid => {
            // A node's own `tree_type` is always resolved to a concrete
            // type at creation time; this arm is unreachable for any node
            // that actually exists.
            return Err(crate::error::UtsError::UnknownTreeType(TreeType::Hybrid as i64));
        }
    };

    if node.height == 0 && matches!(node.tree_type, TreeType::Binomial) {
        // BIN root: truncated to ceil(b_0) rather than MAX_NUM_CHILDREN.
        let cap = params.root_branching_factor.ceil() as u32;
        Ok(raw.min(cap))
    } else {
        Ok(raw.min(MAX_NUM_CHILDREN))
    }
}

fn num_children_bin(node: &Node, params: &Params) -> u32 {
    if node.height == 0 {
        params.root_branching_factor.floor().max(0.0) as u32
    } else {
        let u = node.state.to_unit_interval();
        if u < params.non_leaf_prob {
            params.non_leaf_bf
        } else {
            0
        }
    }
}

fn num_children_balanced(node: &Node, params: &Params) -> u32 {
    if node.height < params.gen_mx {
        params.root_branching_factor.floor().max(0.0) as u32
    } else {
        0
    }
}

fn num_children_geo(node: &Node, params: &Params) -> u32 {
    let b_i = target_branching(node.height, params);
    if b_i <= 0.0 {
        return 0;
    }

    let u = node.state.to_unit_interval();
    let denom = (1.0 - 1.0 / (1.0 + b_i)).ln();
    if denom == 0.0 || !denom.is_finite() {
        return 0;
    }
    let numer = (1.0 - u).ln();
    if !numer.is_finite() {
        // u -> 1 is the "log of non-positive" degeneracy: treat as a leaf.
        return 0;
    }

    let raw = (numer / denom).floor();
    if !raw.is_finite() || raw < 0.0 {
        0
    } else {
        raw as u32
    }
}

/// Target mean branching factor `b_i` at `height`, per `params.shape_fn`.
///
/// At `height == 0` the shape function is never consulted: `b_i` is just
/// `b_0`, same as the original `get_num_children_geo` only switching on
/// `shape_fn` once `depth != 0`.
fn target_branching(height: u32, params: &Params) -> f64 {
    let b_0 = params.root_branching_factor;
    if height == 0 {
        return b_0;
    }

    let gen_mx = params.gen_mx.max(1) as f64;
    let depth = height as f64;

    match params.shape_fn {
        GeoShape::Linear => b_0 * (1.0 - depth / gen_mx),
        GeoShape::ExpDec => b_0 * depth.powf(-b_0.ln() / gen_mx.ln()),
        GeoShape::Cyclic => {
            if depth > 5.0 * gen_mx {
                0.0
            } else {
                b_0.powf((2.0 * std::f64::consts::PI * depth / gen_mx).sin())
            }
        }
        GeoShape::Fixed => {
            if depth < gen_mx {
                b_0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uts::params::GeoShape;

    fn base_params(tree_type: TreeType) -> Params {
        Params {
            tree_type,
            root_branching_factor: 4.0,
            root_seed: 0,
            shape_fn: GeoShape::Linear,
            gen_mx: 6,
            non_leaf_prob: 15.0 / 64.0,
            non_leaf_bf: 4,
            shift_depth: 0.5,
            compute_granularity: 1,
            chunk_size: 20,
            polling_interval_ms: 1,
            overcommit_factor: 1.0,
            verbose: 0,
            debug: 0,
        }
    }

    #[test]
    fn balanced_root_has_floor_b0_children() {
        let params = base_params(TreeType::Balanced);
        let root = init_root(&params);
        assert_eq!(num_children(&root, &params).unwrap(), 4);
    }

    #[test]
    fn balanced_tree_terminates_at_gen_mx() {
        let params = base_params(TreeType::Balanced);
        let mut leaf = init_root(&params);
        leaf.height = params.gen_mx;
        assert_eq!(num_children(&leaf, &params).unwrap(), 0);
    }

    #[test]
    fn bin_degenerate_root_has_zero_children() {
        let mut params = base_params(TreeType::Binomial);
        params.root_branching_factor = 0.0;
        let root = init_root(&params);
        assert_eq!(num_children(&root, &params).unwrap(), 0);
    }

    #[test]
    fn geo_degenerate_shape_returns_zero_not_nan() {
        let mut params = base_params(TreeType::Geometric);
        params.root_branching_factor = 0.0;
        let root = init_root(&params);
        let n = num_children(&root, &params).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn hybrid_child_type_switches_past_the_shift_depth() {
        let params = base_params(TreeType::Hybrid);
        let threshold = (params.shift_depth * params.gen_mx as f64).round() as u32;
        let shallow = Node {
            tree_type: TreeType::Geometric,
            height: threshold.saturating_sub(2),
            num_children: -1,
            state: RngState::seed(1),
        };
        let deep = Node {
            height: threshold.saturating_sub(1),
            ..shallow
        };
        assert_eq!(child_type(&shallow, &params), TreeType::Geometric);
        assert_eq!(child_type(&deep, &params), TreeType::Binomial);
    }

    #[test]
    fn target_branching_ignores_shape_fn_at_the_root() {
        let mut params = base_params(TreeType::Geometric);
        for shape in [GeoShape::Linear, GeoShape::ExpDec, GeoShape::Cyclic, GeoShape::Fixed] {
            params.shape_fn = shape;
            assert_eq!(target_branching(0, &params), params.root_branching_factor);
        }
    }

    #[test]
    fn target_branching_expdec_matches_the_depth_power_law() {
        let mut params = base_params(TreeType::Geometric);
        params.shape_fn = GeoShape::ExpDec;
        let depth = 3u32;
        let expected = params.root_branching_factor
            * (depth as f64).powf(-params.root_branching_factor.ln() / (params.gen_mx as f64).ln());
        assert!((target_branching(depth, &params) - expected).abs() < 1e-9);
    }

    #[test]
    fn target_branching_cyclic_zeroes_out_past_five_gen_mx() {
        let mut params = base_params(TreeType::Geometric);
        params.shape_fn = GeoShape::Cyclic;
        let past_cutoff = 5 * params.gen_mx + 1;
        assert_eq!(target_branching(past_cutoff, &params), 0.0);
    }

    #[test]
    fn target_branching_cyclic_follows_the_sine_envelope() {
        let mut params = base_params(TreeType::Geometric);
        params.shape_fn = GeoShape::Cyclic;
        params.gen_mx = 8;
        let depth = params.gen_mx / 4; // quarter period: sin(2*pi*depth/gen_mx) = sin(pi/2) = 1
        let expected = params.root_branching_factor.powf(1.0);
        assert!((target_branching(depth, &params) - expected).abs() < 1e-9);
    }

    #[test]
    fn target_branching_fixed_drops_to_zero_at_gen_mx() {
        let mut params = base_params(TreeType::Geometric);
        params.shape_fn = GeoShape::Fixed;
        assert_eq!(target_branching(params.gen_mx - 1, &params), params.root_branching_factor);
        assert_eq!(target_branching(params.gen_mx, &params), 0.0);
    }
}
