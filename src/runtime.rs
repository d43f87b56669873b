//! Tokio runtime construction for the worker fleet.
//!
//! Every worker in the fleet runs as a pinned task on a multi-threaded Tokio
//! runtime. The knobs here size that runtime off the CLI's `--workers` and
//! `--num-hosts` arguments rather than off CPU-bound/I/O-bound presets: UTS
//! workers are always CPU-bound (tree expansion), but the fleet also wants a
//! worker thread per logical worker so that a steal RPC never queues behind
//! the stealing worker's own task.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tracing::info;

/// Runtime sizing and responsiveness knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads for the multi-threaded runtime.
    /// If `None`, uses the number of available CPU cores.
    pub worker_threads: Option<usize>,

    /// Maximum number of blocking threads (unused by UTS itself, but
    /// `tokio::task::spawn_blocking` is still reachable from worker code).
    pub max_blocking_threads: usize,

    /// Thread stack size in bytes. Tree expansion recurses through
    /// `gen_children` one frame per `chunk_size`-sized batch, so this is
    /// kept generous rather than the Tokio default.
    pub thread_stack_size: usize,

    /// Thread name prefix for worker threads.
    pub thread_name: String,

    /// Number of event loop ticks before parking. Lower values favor the
    /// latency of steal replies over raw throughput.
    pub event_interval: u32,

    /// Global queue interval for Tokio's own scheduler work-stealing; tuned
    /// down since UTS already does its own work-stealing above this layer
    /// and wants Tokio out of the way.
    pub global_queue_interval: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: 16,
            thread_stack_size: 4 * 1024 * 1024,
            thread_name: "uts-worker".to_string(),
            event_interval: 31,
            global_queue_interval: 61,
        }
    }
}

impl RuntimeConfig {
    /// Size the runtime for exactly `count` logical workers, one OS thread
    /// each, so a steal request never waits behind the work it's stealing.
    pub fn for_worker_count(count: usize) -> Self {
        Self {
            worker_threads: Some(count.max(1)),
            ..Default::default()
        }
    }

    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }
}

/// Builds a configured Tokio [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn for_worker_count(count: usize) -> Self {
        Self::new(RuntimeConfig::for_worker_count(count))
    }

    /// Build the Tokio runtime, with IO and timers enabled unconditionally
    /// so that any downstream use of `tokio::time` (tests included) has a
    /// driver available; the termination ring itself is a single reactive
    /// pass over peers with no sleep or interval of its own.
    pub fn build(self) -> std::io::Result<Runtime> {
        let mut builder = Builder::new_multi_thread();

        if let Some(workers) = self.config.worker_threads {
            builder.worker_threads(workers);
        }
        builder.max_blocking_threads(self.config.max_blocking_threads);
        builder.thread_stack_size(self.config.thread_stack_size);
        builder.thread_name(self.config.thread_name.clone());
        builder.enable_io();
        builder.enable_time();
        builder.event_interval(self.config.event_interval);
        builder.global_queue_interval(self.config.global_queue_interval);

        let runtime = builder.build()?;

        info!(
            workers = ?self.config.worker_threads,
            stack_size = self.config.thread_stack_size,
            "tokio runtime initialized"
        );

        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_time_and_io() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.worker_threads.is_none());
        assert_eq!(cfg.thread_name, "uts-worker");
    }

    #[test]
    fn for_worker_count_pins_thread_count() {
        let cfg = RuntimeConfig::for_worker_count(8);
        assert_eq!(cfg.worker_threads, Some(8));
    }

    #[test]
    fn builder_produces_a_runtime() {
        let rt = RuntimeBuilder::for_worker_count(2).build().unwrap();
        rt.block_on(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
        });
    }
}
