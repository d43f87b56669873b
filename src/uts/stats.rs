//! Per-worker counters, aggregated by the driver into the run's report.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stats {
    pub n_nodes: u64,
    pub n_leaves: u64,
    pub max_stack_depth: u64,
    pub max_tree_depth: u32,
}

impl Stats {
    pub fn record_node(&mut self, height: u32, is_leaf: bool) {
        self.n_nodes += 1;
        if is_leaf {
            self.n_leaves += 1;
        }
        self.max_tree_depth = self.max_tree_depth.max(height);
    }

    pub fn observe_stack_depth(&mut self, depth: usize) {
        self.max_stack_depth = self.max_stack_depth.max(depth as u64);
    }

    pub fn merge(&mut self, other: &Stats) {
        self.n_nodes += other.n_nodes;
        self.n_leaves += other.n_leaves;
        self.max_stack_depth = self.max_stack_depth.max(other.max_stack_depth);
        self.max_tree_depth = self.max_tree_depth.max(other.max_tree_depth);
    }
}

/// Fleet-wide totals plus the run's own metadata, in the shape of the
/// CLI's reporting line.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub totals: Stats,
    pub os_threads: usize,
    pub num_hosts: usize,
    pub walltime: std::time::Duration,
    pub chunk_size: usize,
    pub overcommit_factor: f64,
}

impl RunReport {
    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{:.6},{},{},{:.3}",
            self.os_threads,
            self.num_hosts,
            self.walltime.as_secs_f64(),
            self.totals.n_nodes,
            self.chunk_size,
            self.overcommit_factor
        )
    }

    pub fn to_human(&self) -> String {
        format!(
            "Tree size = {}, tree depth = {}, num leaves = {} ({:.2}%)\n\
             wall time = {:.3} sec, performed on {} worker(s) across {} host(s)\n\
             chunk_size = {}, overcommit_factor = {:.2}",
            self.totals.n_nodes,
            self.totals.max_tree_depth,
            self.totals.n_leaves,
            100.0 * self.totals.n_leaves as f64 / self.totals.n_nodes.max(1) as f64,
            self.walltime.as_secs_f64(),
            self.os_threads,
            self.num_hosts,
            self.chunk_size,
            self.overcommit_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_counts_and_takes_maxima() {
        let mut a = Stats {
            n_nodes: 5,
            n_leaves: 2,
            max_stack_depth: 3,
            max_tree_depth: 4,
        };
        let b = Stats {
            n_nodes: 7,
            n_leaves: 1,
            max_stack_depth: 9,
            max_tree_depth: 2,
        };
        a.merge(&b);
        assert_eq!(a.n_nodes, 12);
        assert_eq!(a.n_leaves, 3);
        assert_eq!(a.max_stack_depth, 9);
        assert_eq!(a.max_tree_depth, 4);
    }

    #[test]
    fn record_node_tracks_depth_and_leaf_count() {
        let mut s = Stats::default();
        s.record_node(3, false);
        s.record_node(4, true);
        assert_eq!(s.n_nodes, 2);
        assert_eq!(s.n_leaves, 1);
        assert_eq!(s.max_tree_depth, 4);
    }
}
