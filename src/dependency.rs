//! Tracking of asynchronous work the host must wait for before treating a render as settled.
//!
//! Producers register futures with [`DependencyContext::collect_promise`]. The host later drains
//! and awaits them ([`DependencyContext::settle`]). Every tracked dependency can be cancelled
//! through its [`DependencyHandle`]; a cancelled dependency resolves to
//! [`LatexError::Cancelled`] at its next poll, whether or not the inner work finished.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use crate::foundation::error::{LatexError, LatexResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyId(pub u64);

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

impl CancelState {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let waker = self
            .waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancels one tracked dependency.
#[derive(Clone)]
pub struct DependencyHandle {
    id: DependencyId,
    cancel: Arc<CancelState>,
}

impl DependencyHandle {
    pub fn id(&self) -> DependencyId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for DependencyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

type BoxedWork = Pin<Box<dyn Future<Output = LatexResult<()>> + Send>>;

/// A registered unit of asynchronous work. Awaiting it yields the work's outcome, or
/// [`LatexError::Cancelled`].
pub struct TrackedDependency {
    id: DependencyId,
    cancel: Arc<CancelState>,
    work: BoxedWork,
}

impl TrackedDependency {
    pub fn id(&self) -> DependencyId {
        self.id
    }

    pub fn handle(&self) -> DependencyHandle {
        DependencyHandle {
            id: self.id,
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl Future for TrackedDependency {
    type Output = LatexResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(Err(LatexError::Cancelled));
        }
        *self
            .cancel
            .waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(cx.waker().clone());
        // Re-check after publishing the waker so a concurrent cancel is not lost.
        if self.cancel.is_cancelled() {
            return Poll::Ready(Err(LatexError::Cancelled));
        }
        self.work.as_mut().poll(cx)
    }
}

impl fmt::Debug for TrackedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedDependency")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Registry of outstanding dependencies for one host render.
#[derive(Default)]
pub struct DependencyContext {
    next_id: AtomicU64,
    tracked: Mutex<Vec<TrackedDependency>>,
}

impl DependencyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `work` as a dependency of the current render.
    pub fn collect_promise<F>(&self, work: F) -> DependencyHandle
    where
        F: Future<Output = LatexResult<()>> + Send + 'static,
    {
        let dep = TrackedDependency {
            id: DependencyId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            cancel: Arc::default(),
            work: Box::pin(work),
        };
        let handle = dep.handle();
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dep);
        tracing::debug!(id = handle.id.0, "dependency collected");
        handle
    }

    /// Dependencies registered and not yet drained.
    pub fn len(&self) -> usize {
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every registered dependency, in registration order.
    pub fn drain(&self) -> Vec<TrackedDependency> {
        std::mem::take(&mut *self.tracked.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Cancel every dependency still registered.
    pub fn cancel_all(&self) {
        for dep in self
            .tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            dep.cancel.cancel();
        }
    }

    /// Drain and await every registered dependency, returning each outcome in registration
    /// order.
    pub async fn settle(&self) -> Vec<(DependencyId, LatexResult<()>)> {
        let mut outcomes = Vec::new();
        for dep in self.drain() {
            let id = dep.id();
            outcomes.push((id, dep.await));
        }
        outcomes
    }
}

impl fmt::Debug for DependencyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContext")
            .field("tracked", &self.len())
            .finish()
    }
}
