//! # uts-stealstack
//!
//! A hierarchical work-stealing scheduler, demonstrated by counting the
//! nodes of a dynamically generated, a-priori-unknown-shape tree: the
//! Unbalanced Tree Search (UTS) benchmark.
//!
//! The search itself is the *driver*. The scheduler (local/shared
//! dual-queue backpressure, a three-tier (self / same-host / remote-host)
//! steal protocol, and ring-based termination detection) is the subject
//! of this crate.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        uts::driver::run                              │
//! │         (sizes the fleet, spawns one tokio task per worker)          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │  uts::worker     │   │     uts::steal      │   │   uts::terminate    │
//! │  (stealstack:    │   │  (self -> same-host │   │  (same-host ring,   │
//! │   local + shared │   │   -> remote-host)   │   │   then remote ring) │
//! │   queue)          │   │                     │   │                     │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐   ┌─────────────────────┐
//! │   uts::node      │   │    uts::transport    │
//! │ (shape engine)   │   │ (the RPC surface a   │
//! │                  │   │  worker exposes)     │
//! └─────────────────┘   └─────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use uts_stealstack::uts::{driver, FleetOptions, GeoShape, Params, TreeType};
//!
//! # #[tokio::main]
//! # async fn main() -> uts_stealstack::Result<()> {
//! let params = Arc::new(Params {
//!     tree_type: TreeType::Balanced,
//!     root_branching_factor: 4.0,
//!     root_seed: 0,
//!     shape_fn: GeoShape::Linear,
//!     gen_mx: 6,
//!     non_leaf_prob: 0.0,
//!     non_leaf_bf: 0,
//!     shift_depth: 0.5,
//!     compute_granularity: 1,
//!     chunk_size: 20,
//!     polling_interval_ms: 1,
//!     overcommit_factor: 1.0,
//!     verbose: 1,
//!     debug: 0,
//! });
//! let report = driver::run(params, FleetOptions { num_hosts: 1, workers_override: Some(4) }).await?;
//! println!("{}", report.to_human());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod error;
pub mod runtime;
pub mod uts;

pub use error::{Result, UtsError};

/// Convenient re-exports for embedding the scheduler in another binary.
pub mod prelude {
    pub use crate::error::{Result, UtsError};
    pub use crate::uts::{
        driver, FleetOptions, GeoShape, Node, Params, RunReport, Stats, Transport, TreeType,
        WorkerState,
    };
}
