//! Unbalanced Tree Search: a hierarchical work-stealing scheduler with
//! termination detection, driven by counting the nodes of a deterministic
//! pseudo-random tree.
//!
//! ```text
//! driver::run
//!     │
//!     ├── builds a WorkerState per rank, partitioned into `num_hosts`
//!     │
//!     ▼
//! worker::tree_search (one tokio task per worker)
//!     │
//!     ├── node / rng          (what are my children?)
//!     ├── queue               (local_q, shared_q)
//!     ├── steal + terminate   (what do I do when I run dry?)
//!     └── transport           (the RPC surface peers call on me)
//! ```

pub mod driver;
pub mod node;
pub mod params;
pub mod queue;
pub mod rng;
pub mod stats;
pub mod steal;
pub mod terminate;
pub mod transport;
pub mod worker;

pub use driver::{run, FleetOptions};
pub use node::{init_root, num_children, Node};
pub use params::{GeoShape, Params, TreeType, MAX_NUM_CHILDREN, MAX_SPAWN_GRANULARITY};
pub use stats::{RunReport, Stats};
pub use transport::Transport;
pub use worker::{tree_search, WorkerState};
