//! Location-transparent RPC contract.
//!
//! One async trait defining the operations a peer can be asked to perform,
//! with a single in-process backend here. A networked backend (peers on
//! other processes or hosts) would implement the same trait over whatever
//! wire protocol it chooses; call sites never know the difference.

use async_trait::async_trait;

use super::node::Node;
use super::stats::Stats;
use crate::Result;

pub type Rank = usize;
pub type HostId = usize;

/// The RPC surface every worker exposes to its peers.
#[async_trait]
pub trait Transport: Send + Sync {
    fn rank(&self) -> Rank;
    fn host(&self) -> HostId;

    async fn put_work_sharedq(&self, nodes: Vec<Node>) -> Result<()>;

    /// Serve a same-host steal request.
    async fn lcl_steal_work(&self) -> Result<(bool, Vec<Node>)>;

    /// Serve an inter-host steal request (larger negotiated chunk).
    async fn remote_steal_work(&self) -> Result<(bool, Vec<Node>)>;

    /// Called on one representative per remote host; aggregates from
    /// itself and its same-host peers.
    async fn remote_aggregate_steal_work(&self) -> Result<(bool, Vec<Node>)>;

    /// Quick non-blocking probe: is my shared queue non-empty?
    async fn lcl_check_work(&self) -> Result<bool>;

    async fn shared_que_size(&self) -> Result<usize>;

    /// Aggregate probe across a host: true iff a peer has spare work.
    async fn remote_check_work(&self) -> Result<bool>;

    /// Single-worker liveness probe used by the terminator.
    async fn check_work(&self) -> Result<bool>;

    /// Host-wide liveness probe used by the terminator across hosts.
    async fn terminate_remote_check_work(&self) -> Result<bool>;

    async fn get_stats(&self) -> Result<Stats>;
}
