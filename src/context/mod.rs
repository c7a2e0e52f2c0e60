//! Request-scoped contexts with cancellation, deadlines and values.
//!
//! A [`Context`] is an immutable chain of layers: values, cancellation scopes
//! and detach boundaries. Deriving a context never mutates its parent.
//!
//! # Detached contexts
//!
//! Work launched from a request (audit writes, cache warmers, async
//! notifications) often has to outlive the request while still carrying its
//! request-scoped values: tenant, request id, tracing data. [`detach`] returns
//! a context that
//!
//! - reports no deadline,
//! - is never done and never reports an error,
//! - forwards every value lookup to its parent,
//! - reports no cancellation cause, even after the parent was cancelled with
//!   one.
//!
//! Contexts derived from a detached context start a fresh cancellation tree.
//!
//! ```
//! use servicekit::context::{detach, Context, ContextKey};
//!
//! const REQUEST_ID: ContextKey<String> = ContextKey::new("request_id");
//!
//! let (request, cancel) = Context::background()
//!     .with_value(REQUEST_ID, "req-1".to_string())
//!     .with_cancel();
//! let background = detach(&request);
//!
//! cancel.cancel();
//! assert!(request.err().is_some());
//! assert!(background.err().is_none());
//! assert_eq!(background.value(&REQUEST_ID).map(String::as_str), Some("req-1"));
//! ```

mod cancel;
mod error;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use cancel::{CancelScope, CancelState};

pub use cancel::CancelHandle;
pub use error::{Cause, ContextError};

/// Typed key for [`Context::with_value`] / [`Context::value`].
///
/// Two keys match when both the name and the value type match, so
/// unrelated modules picking the same name cannot read each other's values
/// by accident.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, _marker: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

enum Node {
    Background,
    Value { parent: Context, name: &'static str, value: Box<dyn Any + Send + Sync> },
    Cancel(CancelScope),
    Detached { parent: Context },
}

/// Immutable, cheaply clonable request context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Node>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// Root context: no deadline, never done, no values.
    pub fn background() -> Self {
        Self { inner: Arc::new(Node::Background) }
    }

    /// Derive a context carrying `value` under `key`.
    pub fn with_value<T>(&self, key: ContextKey<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Node::Value {
                parent: self.clone(),
                name: key.name,
                value: Box::new(value),
            }),
        }
    }

    /// Derive a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        self.with_scope(self.deadline())
    }

    /// Derive a context that is done at `deadline` at the latest.
    ///
    /// A parent deadline that is earlier wins.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancelHandle) {
        let effective = match self.deadline() {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.with_scope(Some(effective))
    }

    /// Derive a context that is done after `timeout` at the latest.
    ///
    /// A timeout too large to represent as an instant adds no deadline; the
    /// result is then only cancellable.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelHandle) {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.with_cancel(),
        }
    }

    /// Derive a context severed from this one's deadline and cancellation.
    ///
    /// See the [module docs](self).
    pub fn detach(&self) -> Self {
        Self { inner: Arc::new(Node::Detached { parent: self.clone() }) }
    }

    fn with_scope(&self, deadline: Option<Instant>) -> (Self, CancelHandle) {
        let token = match self.nearest_scope() {
            Some(scope) => scope.token.child_token(),
            None => CancellationToken::new(),
        };
        let scope = CancelScope {
            parent: self.clone(),
            token,
            deadline,
            state: Arc::new(CancelState::default()),
        };
        let handle = CancelHandle::new(&scope);
        (Self { inner: Arc::new(Node::Cancel(scope)) }, handle)
    }

    /// Nearest cancellation scope, not looking past a detach boundary.
    fn nearest_scope(&self) -> Option<&CancelScope> {
        let mut current = self;
        loop {
            match &*current.inner {
                Node::Value { parent, .. } => current = parent,
                Node::Cancel(scope) => return Some(scope),
                Node::Background | Node::Detached { .. } => return None,
            }
        }
    }

    /// The instant this context is done at, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.nearest_scope().and_then(|scope| scope.deadline)
    }

    /// Why this context is done, or `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        self.nearest_scope().and_then(CancelScope::err)
    }

    /// The cause passed to [`CancelHandle::cancel_with_cause`], falling back
    /// to [`err`](Self::err) when the context is done without one.
    pub fn cause(&self) -> Option<Cause> {
        self.nearest_scope().and_then(CancelScope::cause)
    }

    /// Resolves once the context is done. Never resolves for background and
    /// detached contexts.
    pub async fn done(&self) {
        let Some(scope) = self.nearest_scope() else {
            return std::future::pending::<()>().await;
        };
        match scope.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = scope.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => scope.token.cancelled().await,
        }
    }

    /// Run `fut` until it completes or the context is done, whichever comes
    /// first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            _ = self.done() => Err(self.err().unwrap_or(ContextError::Canceled)),
            output = fut => Ok(output),
        }
    }

    /// Look up the value stored under `key` in this context or its ancestors.
    pub fn value<T>(&self, key: &ContextKey<T>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        let mut current = self;
        loop {
            match &*current.inner {
                Node::Value { parent, name, value } => {
                    if *name == key.name {
                        if let Some(found) = value.downcast_ref::<T>() {
                            return Some(found);
                        }
                    }
                    current = parent;
                }
                Node::Cancel(scope) => current = &scope.parent,
                Node::Detached { parent } => current = parent,
                Node::Background => return None,
            }
        }
    }

    /// Whether both handles refer to the same context layer.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            Node::Background => f.write_str("context.Background"),
            Node::Value { parent, name, .. } => write!(f, "{:?}.WithValue({})", parent, name),
            Node::Cancel(scope) => match scope.deadline {
                Some(_) => write!(f, "{:?}.WithDeadline", scope.parent),
                None => write!(f, "{:?}.WithCancel", scope.parent),
            },
            Node::Detached { parent } => write!(f, "{:?}.Detached", parent),
        }
    }
}

/// Derive a context severed from `parent`'s deadline and cancellation.
pub fn detach(parent: &Context) -> Context {
    parent.detach()
}
