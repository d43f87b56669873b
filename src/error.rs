//! Crate-wide error type.
//!
//! One `thiserror` enum covering every failure domain, a `Result<T>` alias,
//! and an `exit_code()` so `main` can translate a failure straight into a
//! process exit status.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UtsError>;

#[derive(Error, Debug)]
pub enum UtsError {
    /// A pop was attempted against a queue already known to be empty.
    /// Recoverable: callers treat this as "steal failed", never raised
    /// past `ensure_local_work`.
    #[error("queue underflow: attempted to pop from an empty queue")]
    QueueUnderflow,

    /// `get_work` returned zero nodes after `ensure_local_work` reported
    /// that work was available. This is an invariant violation, not an
    /// ordinary empty-queue condition, and is never expected to occur.
    #[error("get_work(): underflow after ensure_local_work reported work available")]
    GetWorkInvariantViolated,

    #[error("unknown tree type code: {0}")]
    UnknownTreeType(i64),

    #[error("unknown geometric shape code: {0}")]
    UnknownGeoShape(i64),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("runtime construction failed: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UtsError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Whether the failure is expected to occur in the steady-state steal
    /// protocol (and so should not abort the run).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueueUnderflow)
    }

    /// Maps a failure onto a process exit code, the way `main` reports it.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidParams(_) | Self::UnknownTreeType(_) | Self::UnknownGeoShape(_) => 2,
            Self::GetWorkInvariantViolated => 3,
            Self::Runtime(_) | Self::Join(_) => 5,
            Self::QueueUnderflow => 1,
            Self::Other(_) => 1,
        }
    }
}
