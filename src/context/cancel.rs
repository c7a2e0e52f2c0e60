//! Cancellation scopes.
//!
//! Each `with_cancel`/`with_deadline` layer owns a [`CancellationToken`] that
//! is a child of the nearest enclosing scope's token, so cancelling a parent
//! cancels every descendant without any bookkeeping here. The scope records
//! *why* it was cancelled in write-once slots.

use std::sync::{Arc, OnceLock};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{Cause, ContextError};
use super::Context;

#[derive(Debug, Default)]
pub(super) struct CancelState {
    pub(super) err: OnceLock<ContextError>,
    pub(super) cause: OnceLock<Cause>,
}

pub(super) struct CancelScope {
    pub(super) parent: Context,
    pub(super) token: CancellationToken,
    pub(super) deadline: Option<Instant>,
    pub(super) state: Arc<CancelState>,
}

impl CancelScope {
    pub(super) fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub(super) fn err(&self) -> Option<ContextError> {
        if let Some(err) = self.state.err.get() {
            return Some(*err);
        }
        if self.token.is_cancelled() {
            // cancelled through an ancestor scope
            return self.parent.err().or(Some(ContextError::Canceled));
        }
        if self.deadline_passed() {
            return Some(ContextError::DeadlineExceeded);
        }
        None
    }

    pub(super) fn cause(&self) -> Option<Cause> {
        if let Some(cause) = self.state.cause.get() {
            return Some(Arc::clone(cause));
        }
        if let Some(err) = self.state.err.get() {
            return Some(Arc::new(*err));
        }
        if self.token.is_cancelled() {
            return self.parent.cause().or_else(|| Some(Arc::new(ContextError::Canceled)));
        }
        if self.deadline_passed() {
            return Some(Arc::new(ContextError::DeadlineExceeded));
        }
        None
    }
}

/// Cancels the context returned alongside it.
///
/// Dropping the handle does **not** cancel. Cancelling is idempotent and the
/// first cause wins; cancelling a context that is already done (through an
/// ancestor or its deadline) is a no-op.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    deadline: Option<Instant>,
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub(super) fn new(scope: &CancelScope) -> Self {
        Self {
            token: scope.token.clone(),
            deadline: scope.deadline,
            state: Arc::clone(&scope.state),
        }
    }

    /// Cancel with [`ContextError::Canceled`] as the cause.
    pub fn cancel(&self) {
        self.cancel_inner(None);
    }

    /// Cancel and record `cause`, retrievable through [`Context::cause`].
    pub fn cancel_with_cause<E>(&self, cause: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cancel_inner(Some(Arc::new(cause)));
    }

    /// Whether the associated context is done for any reason.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn cancel_inner(&self, cause: Option<Cause>) {
        if self.is_cancelled() {
            return;
        }
        // cause before err: readers that see err must also see the cause
        if let Some(cause) = cause {
            let _ = self.state.cause.set(cause);
        }
        let _ = self.state.err.set(ContextError::Canceled);
        self.token.cancel();
        tracing::trace!("context cancelled");
    }
}
