//! The `stealstack` worker actor.
//!
//! Each worker owns a private local queue and a shared (stealable) queue.
//! Only the owner ever touches `local_q`; every other field a peer can
//! reach through [`Transport`] (`shared_q` and the counters) is designed
//! to be called concurrently with the owner's own `tree_search` loop, so
//! no actor mailbox or serialization is needed: the two queues already have
//! independent locks, and the counters are atomic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{instrument, trace};

use super::node::{self, Node};
use super::params::{Params, MAX_SPAWN_GRANULARITY};
use super::queue::Deque;
use super::rng;
use super::stats::Stats;
use super::steal;
use super::transport::{HostId, Rank, Transport};
use crate::error::UtsError;
use crate::Result;

#[derive(Default)]
struct PeerSet {
    same_host: Vec<Weak<WorkerState>>,
    remote_head_per_host: Vec<Weak<WorkerState>>,
}

pub struct WorkerState {
    rank: Rank,
    host: HostId,
    params: Arc<Params>,
    local_q: Deque<Node>,
    shared_q: Deque<Node>,
    local_count: AtomicUsize,
    shared_count: AtomicUsize,
    /// Serializes the check-then-spill-then-append sequence in `put_work`
    /// against concurrent calls from this worker's own expansion tasks.
    local_lock: Mutex<()>,
    peers: RwLock<PeerSet>,
    stats: Mutex<Stats>,
}

impl WorkerState {
    pub fn new(rank: Rank, host: HostId, params: Arc<Params>) -> Arc<Self> {
        Arc::new(Self {
            rank,
            host,
            params,
            local_q: Deque::new(),
            shared_q: Deque::new(),
            local_count: AtomicUsize::new(0),
            shared_count: AtomicUsize::new(0),
            local_lock: Mutex::new(()),
            peers: RwLock::new(PeerSet::default()),
            stats: Mutex::new(Stats::default()),
        })
    }

    /// Seeds the root node on rank 0. One-shot, called once per run before
    /// any worker starts `tree_search`.
    pub fn init(&self) {
        if self.rank == 0 {
            let root = node::init_root(&self.params);
            let _guard = self.local_lock.lock();
            self.local_q.push_front(root);
            self.local_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Classifies the fleet into same-host peers and one representative
    /// per remote host. Peers are kept as [`Weak`] references: every
    /// worker holds a handle to every other worker including itself, a
    /// reference cycle that must not pin memory after the run ends.
    pub fn resolve_names(&self, fleet: &[Arc<WorkerState>]) {
        let mut same_host = Vec::new();
        let mut remote_head_per_host = Vec::new();
        let mut seen_hosts = std::collections::HashSet::new();

        for peer in fleet {
            if std::ptr::eq(peer.as_ref(), self) {
                continue;
            }
            if peer.host == self.host {
                same_host.push(Arc::downgrade(peer));
            } else if seen_hosts.insert(peer.host) {
                remote_head_per_host.push(Arc::downgrade(peer));
            }
        }

        *self.peers.write() = PeerSet {
            same_host,
            remote_head_per_host,
        };
    }

    pub fn rank_of(&self) -> Rank {
        self.rank
    }

    pub(super) fn same_host_peers(&self) -> Vec<Arc<WorkerState>> {
        self.peers.read().same_host.iter().filter_map(Weak::upgrade).collect()
    }

    pub(super) fn remote_reps(&self) -> Vec<Arc<WorkerState>> {
        self.peers
            .read()
            .remote_head_per_host
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Spill policy: append if there's room, otherwise donate the cold
    /// (back) half of the local queue to the shared queue first.
    fn put_work(&self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        let max_local = self.params.max_local();
        let _guard = self.local_lock.lock();
        let current = self.local_q.len();

        if current < max_local {
            let added = nodes.len();
            self.local_q.push_front_bulk(nodes);
            self.local_count.fetch_add(added, Ordering::AcqRel);
            return;
        }

        // Overflow: donate the cold (back) half to the shared queue. Normal
        // push/pop both happen at the front, so anything that has drifted to
        // the back has sat unpopped the longest and is the safest to give
        // away to a stealer.
        let target = max_local / 2;
        let mut donated = Vec::new();
        while self.local_q.len() > target {
            match self.local_q.pop_back() {
                Some(n) => donated.push(n),
                None => break,
            }
        }
        let donated_count = donated.len();
        if donated_count > 0 {
            self.local_count.fetch_sub(donated_count, Ordering::AcqRel);
            self.shared_q.push_back_bulk(donated);
            self.shared_count.fetch_add(donated_count, Ordering::AcqRel);
        }

        let added = nodes.len();
        self.local_q.push_front_bulk(nodes);
        self.local_count.fetch_add(added, Ordering::AcqRel);
    }

    /// Places stolen nodes at the front of the local queue so the owner's
    /// next pop resumes depth-first.
    pub(super) fn accept_stolen(&self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        let _guard = self.local_lock.lock();
        let added = nodes.len();
        self.local_q.push_front_bulk(nodes);
        self.local_count.fetch_add(added, Ordering::AcqRel);
    }

    fn pop_local_chunk(&self) -> Vec<Node> {
        let _guard = self.local_lock.lock();
        let popped = self.local_q.pop_front_bulk(self.params.chunk_size);
        self.local_count.fetch_sub(popped.len(), Ordering::AcqRel);
        popped
    }

    /// The chunk-size negotiation table of the steal protocol (shared by
    /// `lcl_steal_work` and `remote_steal_work`).
    fn steal_shared(&self, remote: bool) -> (bool, Vec<Node>) {
        let max_local = self.params.max_local();
        let chunk_size = self.params.chunk_size;
        let count = self.shared_count.load(Ordering::Acquire);

        let steal_num = if count == 0 {
            return (false, Vec::new());
        } else if count >= max_local {
            if remote {
                count / 2
            } else {
                max_local / 2
            }
        } else if count >= 2 * chunk_size {
            let mut k = (max_local / 2).max(1);
            while k > count {
                k /= 2;
            }
            k.max(1)
        } else if count >= chunk_size {
            chunk_size
        } else {
            count
        };

        let popped = self.shared_q.pop_front_bulk(steal_num);
        let n = popped.len();
        if n > 0 {
            self.shared_count.fetch_sub(n, Ordering::AcqRel);
        }
        (n > 0, popped)
    }

    fn observe_depth(&self) {
        let depth = self.local_count.load(Ordering::Acquire) + self.shared_count.load(Ordering::Acquire);
        self.stats.lock().observe_stack_depth(depth);
    }

    pub fn snapshot_stats(&self) -> Stats {
        *self.stats.lock()
    }
}

#[async_trait]
impl Transport for WorkerState {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn host(&self) -> HostId {
        self.host
    }

    async fn put_work_sharedq(&self, nodes: Vec<Node>) -> Result<()> {
        let added = nodes.len();
        self.shared_q.push_back_bulk(nodes);
        self.shared_count.fetch_add(added, Ordering::AcqRel);
        Ok(())
    }

    async fn lcl_steal_work(&self) -> Result<(bool, Vec<Node>)> {
        Ok(self.steal_shared(false))
    }

    async fn remote_steal_work(&self) -> Result<(bool, Vec<Node>)> {
        Ok(self.steal_shared(true))
    }

    async fn remote_aggregate_steal_work(&self) -> Result<(bool, Vec<Node>)> {
        let max_local = self.params.max_local();
        let mut out = Vec::new();

        let (ok, mut nodes) = self.steal_shared(true);
        if ok {
            out.append(&mut nodes);
        }

        for peer in self.same_host_peers() {
            if out.len() > 2 * max_local {
                break;
            }
            let (ok, mut nodes) = peer.steal_shared(true);
            if ok {
                out.append(&mut nodes);
            }
        }

        Ok((!out.is_empty(), out))
    }

    async fn lcl_check_work(&self) -> Result<bool> {
        Ok(self.shared_count.load(Ordering::Acquire) > 0)
    }

    async fn shared_que_size(&self) -> Result<usize> {
        Ok(self.shared_count.load(Ordering::Acquire))
    }

    async fn remote_check_work(&self) -> Result<bool> {
        let max_local = self.params.max_local();
        let mine = self.shared_count.load(Ordering::Acquire);
        let peers = self.same_host_peers();
        let peer_counts: Vec<usize> = peers
            .iter()
            .map(|p| p.shared_count.load(Ordering::Acquire))
            .collect();
        if mine >= max_local || peer_counts.iter().any(|&c| c >= max_local) {
            return Ok(true);
        }
        let total: usize = mine + peer_counts.iter().sum::<usize>();
        Ok(total > 2 * max_local)
    }

    async fn check_work(&self) -> Result<bool> {
        Ok(self.local_count.load(Ordering::Acquire) > 0 || self.shared_count.load(Ordering::Acquire) > 0)
    }

    async fn terminate_remote_check_work(&self) -> Result<bool> {
        for peer in self.same_host_peers() {
            if peer.check_work().await? {
                return Ok(true);
            }
        }
        self.check_work().await
    }

    async fn get_stats(&self) -> Result<Stats> {
        Ok(self.snapshot_stats())
    }
}

/// Pulls up to `chunk_size` nodes from the local queue, stealing (and, if
/// that also fails, probing for termination) when it's empty. `Ok(None)`
/// means every probe came back empty: this worker may terminate.
async fn get_work(state: &Arc<WorkerState>) -> Result<Option<Vec<Node>>> {
    if state.local_count.load(Ordering::Acquire) == 0 && !steal::ensure_local_work(state).await {
        return Ok(None);
    }
    let chunk = state.pop_local_chunk();
    if chunk.is_empty() {
        return Err(UtsError::GetWorkInvariantViolated);
    }
    Ok(Some(chunk))
}

/// Expands one node's children, splitting into ranges of at most
/// `MAX_SPAWN_GRANULARITY` and fanning those ranges out across tasks when
/// a single node declares an unusually large number of children.
async fn expand_node(state: Arc<WorkerState>, n: Node) -> Result<Vec<Node>> {
    let count = node::num_children(&n, &state.params)?;
    state.stats.lock().record_node(n.height, count == 0);

    if count == 0 {
        return Ok(Vec::new());
    }

    let child_type = node::child_type(&n, &state.params);
    let count = count as u64;

    if (count as usize) <= MAX_SPAWN_GRANULARITY {
        return Ok(expand_range(&state.params, n, child_type, 0..count));
    }

    let mut set = tokio::task::JoinSet::new();
    let mut start = 0u64;
    while start < count {
        let end = (start + MAX_SPAWN_GRANULARITY as u64).min(count);
        let params = state.params.clone();
        set.spawn(async move { expand_range(&params, n, child_type, start..end) });
        start = end;
    }

    let mut children = Vec::with_capacity(count as usize);
    while let Some(res) = set.join_next().await {
        children.extend(res.map_err(UtsError::from)?);
    }
    Ok(children)
}

fn expand_range(
    params: &Params,
    parent: Node,
    child_type: super::params::TreeType,
    range: std::ops::Range<u64>,
) -> Vec<Node> {
    range
        .map(|i| Node {
            tree_type: child_type,
            height: parent.height + 1,
            num_children: -1,
            state: rng::derive_child_state(parent.state, i, params.compute_granularity),
        })
        .collect()
}

/// The worker's main loop: pull a chunk, expand every node in it
/// concurrently, push children back, repeat until termination.
#[instrument(skip(state), fields(rank = state.rank))]
pub async fn tree_search(state: Arc<WorkerState>) -> Result<()> {
    loop {
        let chunk = match get_work(&state).await? {
            Some(chunk) => chunk,
            None => {
                trace!(rank = state.rank, "tree_search returning: no work anywhere");
                return Ok(());
            }
        };

        let mut set = tokio::task::JoinSet::new();
        for n in chunk {
            let st = state.clone();
            set.spawn(async move { expand_node(st, n).await });
        }

        let mut children = Vec::new();
        while let Some(res) = set.join_next().await {
            children.extend(res.map_err(UtsError::from)??);
        }

        if !children.is_empty() {
            state.put_work(children);
        }
        state.observe_depth();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uts::params::{GeoShape, TreeType};

    fn params(tree_type: TreeType) -> Arc<Params> {
        Arc::new(Params {
            tree_type,
            root_branching_factor: 4.0,
            root_seed: 0,
            shape_fn: GeoShape::Linear,
            gen_mx: 4,
            non_leaf_prob: 0.5,
            non_leaf_bf: 4,
            shift_depth: 0.5,
            compute_granularity: 1,
            chunk_size: 4,
            polling_interval_ms: 1,
            overcommit_factor: 1.0,
            verbose: 0,
            debug: 0,
        })
    }

    fn filler_nodes(n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| Node {
                tree_type: TreeType::Balanced,
                height: 1,
                num_children: -1,
                state: rng::derive_child_state(rng::RngState::seed(0), i as u64, 1),
            })
            .collect()
    }

    #[test]
    fn put_work_appends_in_one_shot_even_past_max_local() {
        // The spill guard only looks at local_count *before* this call, not
        // at current + nodes.len(), so a single big batch landing on an
        // empty (or under-threshold) queue is never split mid-call.
        let state = WorkerState::new(0, 0, params(TreeType::Balanced));
        let max_local = state.params.max_local();
        state.put_work(filler_nodes(max_local + 3));
        assert_eq!(state.local_q.len(), max_local + 3);
        assert_eq!(state.shared_count.load(Ordering::Acquire), 0);
        assert_eq!(state.local_count.load(Ordering::Acquire), max_local + 3);
    }

    #[test]
    fn put_work_spills_once_local_count_is_already_at_max() {
        let state = WorkerState::new(0, 0, params(TreeType::Balanced));
        let max_local = state.params.max_local();
        state.put_work(filler_nodes(max_local));
        state.put_work(filler_nodes(3));
        assert!(state.local_q.len() <= state.params.max_local() / 2 + 3);
        assert!(state.shared_count.load(Ordering::Acquire) > 0);
        assert_eq!(
            state.local_count.load(Ordering::Acquire) + state.shared_count.load(Ordering::Acquire),
            max_local + 3
        );
    }

    #[tokio::test]
    async fn single_worker_tree_search_counts_balanced_tree() {
        let state = WorkerState::new(0, 0, params(TreeType::Balanced));
        state.resolve_names(&[state.clone()]);
        state.init();
        tree_search(state.clone()).await.unwrap();
        let stats = state.snapshot_stats();
        // b_0=4, gen_mx=4: (4^5 - 1) / 3 = 341, leaves = 4^4 = 256
        assert_eq!(stats.n_nodes, 341);
        assert_eq!(stats.n_leaves, 256);
    }
}
