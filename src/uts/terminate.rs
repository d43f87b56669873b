//! Termination detector.
//!
//! Two concentric rings: same-host peers first, then one representative
//! per remote host (who in turn runs its own same-host ring). A single
//! "true" anywhere sends the caller back to stage 1 of the steal protocol.
//! This is a benign under-approximation, not a coordinated two-phase
//! commit, see the design notes on the termination race this accepts.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::debug;

use super::transport::Transport;
use super::worker::WorkerState;

/// `true` if some peer (same-host or remote) reported live work; `false`
/// only once every probe in both rings reports empty.
pub async fn detect_termination(state: &Arc<WorkerState>) -> bool {
    if same_host_ring(state).await {
        return true;
    }
    if remote_ring(state).await {
        return true;
    }
    debug!(rank = state.rank(), "both termination rings reported empty");
    false
}

async fn same_host_ring(state: &Arc<WorkerState>) -> bool {
    let peers = state.same_host_peers();
    let mut probes: FuturesUnordered<_> = peers
        .into_iter()
        .map(|peer| async move { peer.check_work().await.unwrap_or(false) })
        .collect();

    while let Some(has_work) = probes.next().await {
        if has_work {
            return true;
        }
    }
    false
}

async fn remote_ring(state: &Arc<WorkerState>) -> bool {
    let reps = state.remote_reps();
    let mut probes: FuturesUnordered<_> = reps
        .into_iter()
        .map(|peer| async move { peer.terminate_remote_check_work().await.unwrap_or(false) })
        .collect();

    while let Some(has_work) = probes.next().await {
        if has_work {
            return true;
        }
    }
    false
}
