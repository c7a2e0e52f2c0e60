//! Context errors and cancellation causes.

use std::sync::Arc;
use thiserror::Error;

/// Why a context is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// Cancelled through a [`CancelHandle`](super::CancelHandle) or an ancestor's.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Shared, type-erased cancellation cause.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;
