//! Hierarchical steal protocol.
//!
//! Self-shared, then same-host peers, then remote-host representatives,
//! then termination detection, tried in that order every time a worker's
//! local queue runs dry. On any success the stolen nodes land at the front
//! of the local queue so expansion stays depth-first.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::trace;

use super::terminate;
use super::transport::Transport;
use super::worker::WorkerState;

/// Returns `true` once more local work is available, `false` once every
/// probe in both termination rings came back empty.
pub async fn ensure_local_work(state: &Arc<WorkerState>) -> bool {
    loop {
        if try_self_steal(state).await {
            return true;
        }
        if try_same_host_steal(state).await {
            return true;
        }
        if try_remote_steal(state).await {
            return true;
        }
        if !terminate::detect_termination(state).await {
            return false;
        }
        // a probe found live work elsewhere; loop back to stage 1.
    }
}

async fn try_self_steal(state: &Arc<WorkerState>) -> bool {
    let (ok, nodes) = match state.lcl_steal_work().await {
        Ok(v) => v,
        Err(_) => return false,
    };
    if ok {
        trace!(rank = state.rank(), stolen = nodes.len(), "self-shared steal");
        state.accept_stolen(nodes);
    }
    ok
}

async fn try_same_host_steal(state: &Arc<WorkerState>) -> bool {
    let peers = state.same_host_peers();
    if peers.is_empty() {
        return false;
    }

    let mut probes: FuturesUnordered<_> = peers
        .into_iter()
        .map(|peer| async move {
            let has_work = peer.lcl_check_work().await.unwrap_or(false);
            (peer, has_work)
        })
        .collect();

    while let Some((peer, has_work)) = probes.next().await {
        if !has_work {
            continue;
        }
        if let Ok((ok, nodes)) = peer.lcl_steal_work().await {
            if ok {
                trace!(
                    rank = state.rank(),
                    from = peer.rank(),
                    stolen = nodes.len(),
                    "same-host steal"
                );
                state.accept_stolen(nodes);
                return true;
            }
        }
    }
    false
}

async fn try_remote_steal(state: &Arc<WorkerState>) -> bool {
    let reps = state.remote_reps();
    if reps.is_empty() {
        return false;
    }

    let mut probes: FuturesUnordered<_> = reps
        .into_iter()
        .map(|peer| async move {
            let has_work = peer.remote_check_work().await.unwrap_or(false);
            (peer, has_work)
        })
        .collect();

    while let Some((peer, has_work)) = probes.next().await {
        if !has_work {
            continue;
        }
        if let Ok((ok, nodes)) = peer.remote_aggregate_steal_work().await {
            if ok {
                trace!(
                    rank = state.rank(),
                    from_host = peer.host(),
                    stolen = nodes.len(),
                    "remote steal"
                );
                state.accept_stolen(nodes);
                return true;
            }
        }
    }
    false
}
