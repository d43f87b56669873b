//! Fleet construction and run orchestration, the analogue of the original
//! benchmark's `hpx_main`: build the stealstacks, seed the root, dispatch
//! `tree_search` on every worker, wait for them all, collect stats.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::params::Params;
use super::stats::{RunReport, Stats};
use super::worker::{self, WorkerState};
use crate::error::UtsError;
use crate::Result;

/// Knobs the CLI exposes beyond what's in [`Params`] itself: how the
/// fleet is laid out across (simulated) hosts.
pub struct FleetOptions {
    pub num_hosts: usize,
    /// Overrides the `os_threads * overcommit_factor` sizing when set.
    pub workers_override: Option<usize>,
}

fn os_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn workers_per_host(params: &Params, options: &FleetOptions) -> usize {
    options.workers_override.unwrap_or_else(|| {
        ((os_threads() as f64) * params.overcommit_factor).ceil().max(1.0) as usize
    })
}

/// Builds the fleet, runs the search to completion, and reports totals.
///
/// One OS process hosts every worker; `num_hosts` partitions the fleet
/// into logical hosts so the same-host/remote-host steal tiers have
/// something to distinguish, without requiring an actual network.
pub async fn run(params: Arc<Params>, options: FleetOptions) -> Result<RunReport> {
    let per_host = workers_per_host(&params, &options);
    let num_hosts = options.num_hosts.max(1);
    let fleet_size = per_host * num_hosts;

    info!(num_hosts, per_host, fleet_size, "constructing worker fleet");

    let fleet: Vec<Arc<WorkerState>> = (0..fleet_size)
        .map(|rank| {
            let host = rank / per_host;
            WorkerState::new(rank, host, params.clone())
        })
        .collect();

    for worker in &fleet {
        worker.resolve_names(&fleet);
    }
    fleet[0].init();

    let start = Instant::now();

    let mut set = tokio::task::JoinSet::new();
    for worker in fleet.iter().cloned() {
        set.spawn(async move { worker::tree_search(worker).await });
    }
    while let Some(res) = set.join_next().await {
        res.map_err(UtsError::from)??;
    }

    let walltime = start.elapsed();

    let mut totals = Stats::default();
    for worker in &fleet {
        totals.merge(&worker.snapshot_stats());
    }

    info!(
        nodes = totals.n_nodes,
        leaves = totals.n_leaves,
        walltime_secs = walltime.as_secs_f64(),
        "tree_search complete"
    );

    Ok(RunReport {
        totals,
        os_threads: os_threads(),
        num_hosts,
        walltime,
        chunk_size: params.chunk_size,
        overcommit_factor: params.overcommit_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uts::params::{GeoShape, TreeType};

    fn balanced_params(b_0: f64, gen_mx: u32, chunk_size: usize) -> Arc<Params> {
        Arc::new(Params {
            tree_type: TreeType::Balanced,
            root_branching_factor: b_0,
            root_seed: 0,
            shape_fn: GeoShape::Linear,
            gen_mx,
            non_leaf_prob: 0.0,
            non_leaf_bf: 0,
            shift_depth: 0.5,
            compute_granularity: 1,
            chunk_size,
            polling_interval_ms: 1,
            overcommit_factor: 1.0,
            verbose: 0,
            debug: 0,
        })
    }

    #[tokio::test]
    async fn single_worker_balanced_tree_matches_closed_form() {
        let params = balanced_params(4.0, 6, 20);
        let report = run(
            params,
            FleetOptions {
                num_hosts: 1,
                workers_override: Some(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.totals.n_nodes, 5461);
        assert_eq!(report.totals.n_leaves, 4096);
    }

    #[tokio::test]
    async fn multi_worker_matches_single_worker_totals() {
        let params = balanced_params(4.0, 6, 20);
        let report = run(
            params,
            FleetOptions {
                num_hosts: 1,
                workers_override: Some(8),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.totals.n_nodes, 5461);
        assert_eq!(report.totals.n_leaves, 4096);
        assert_eq!(report.totals.max_tree_depth, 6);
    }

    #[tokio::test]
    async fn multi_host_matches_single_worker_totals() {
        let params = balanced_params(3.0, 8, 1);
        let report = run(
            params,
            FleetOptions {
                num_hosts: 2,
                workers_override: Some(4),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.totals.n_nodes, 9841);
        assert_eq!(report.totals.n_leaves, 6561);
    }

    #[tokio::test]
    async fn degenerate_root_terminates_immediately() {
        let params = balanced_params(0.0, 6, 20);
        let report = run(
            params,
            FleetOptions {
                num_hosts: 1,
                workers_override: Some(4),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.totals.n_nodes, 1);
        assert_eq!(report.totals.n_leaves, 1);
    }
}
