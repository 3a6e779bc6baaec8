//! Coalescing update scheduler.
//!
//! Widgets do not redraw as soon as their state changes. Instead they ask the
//! scheduler for an update, and the scheduler runs one reconciliation pass per
//! widget at the next frame, however many requests arrived in between. A
//! model edit, a metadata edit and an attach in the same turn therefore cost a
//! single redraw.
//!
//! The scheduler holds its targets weakly. A target that has been dropped or
//! reports itself disposed by the time the frame is flushed is skipped
//! silently.
//!
//! # Driving Frames
//!
//! The host decides when a frame happens by calling [`UpdateScheduler::flush`].
//! Hosts running on tokio can wait for work with
//! [`UpdateScheduler::next_frame`] or let [`UpdateScheduler::spawn_frame_loop`]
//! do both:
//!
//! ```no_run
//! use std::time::Duration;
//! use horizon_notebook_core::UpdateScheduler;
//!
//! # async fn run() {
//! let scheduler = UpdateScheduler::global();
//! let frames = scheduler.spawn_frame_loop(Duration::from_millis(16));
//! # frames.abort();
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Result, SchedulerError};
use crate::logging::PerfSpan;
use crate::signal::Signal;

/// Global scheduler instance.
static GLOBAL_SCHEDULER: OnceLock<Arc<UpdateScheduler>> = OnceLock::new();

/// Counter for generating unique target IDs.
static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for something that can be scheduled for update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpdateTargetId(u64);

impl UpdateTargetId {
    /// Allocate a fresh, process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Something that reconciles its visible state on request.
pub trait UpdateTarget: Send + Sync {
    /// The stable identity used to coalesce requests.
    fn update_target_id(&self) -> UpdateTargetId;

    /// Whether the target has been disposed. Disposed targets are never
    /// reconciled.
    fn is_disposed(&self) -> bool;

    /// Run one reconciliation pass.
    fn process_update(&self);
}

/// Coalesces update requests into one reconciliation per target per frame.
pub struct UpdateScheduler {
    /// Targets awaiting reconciliation, in request order.
    pending: Mutex<IndexMap<UpdateTargetId, Weak<dyn UpdateTarget>>>,
    /// Number of completed flushes.
    frames: AtomicU64,
    /// Wakes `next_frame` waiters.
    notify: Notify,
    /// Emitted when the first request of a frame arrives.
    ///
    /// Hosts that drive frames from their own event loop connect here to
    /// schedule a flush.
    pub frame_requested: Signal<()>,
}

impl UpdateScheduler {
    /// Create a new, empty scheduler.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(IndexMap::new()),
            frames: AtomicU64::new(0),
            notify: Notify::new(),
            frame_requested: Signal::new(),
        }
    }

    /// Get the process-wide scheduler, creating it on first use.
    pub fn global() -> Arc<UpdateScheduler> {
        GLOBAL_SCHEDULER
            .get_or_init(|| Arc::new(UpdateScheduler::new()))
            .clone()
    }

    /// Request a reconciliation of `target` at the next flush.
    ///
    /// Repeated requests for the same target before the flush are merged.
    /// Returns `true` if the target was not already pending.
    #[tracing::instrument(skip_all, target = "horizon_notebook_core::scheduler", level = "trace")]
    pub fn request_update(&self, target: Weak<dyn UpdateTarget>) -> bool {
        let Some(strong) = target.upgrade() else {
            return false;
        };
        if strong.is_disposed() {
            tracing::trace!(target: "horizon_notebook_core::scheduler", "ignoring update request for disposed target");
            return false;
        }
        let id = strong.update_target_id();
        drop(strong);

        let (inserted, first_in_frame) = {
            let mut pending = self.pending.lock();
            let was_empty = pending.is_empty();
            let inserted = pending.insert(id, target).is_none();
            (inserted, was_empty && inserted)
        };

        if inserted {
            tracing::trace!(target: "horizon_notebook_core::scheduler", ?id, "update requested");
        }
        if first_in_frame {
            self.notify.notify_one();
            self.frame_requested.emit(());
        }
        inserted
    }

    /// Whether an update for `id` is waiting for the next flush.
    pub fn is_pending(&self, id: UpdateTargetId) -> bool {
        self.pending.lock().contains_key(&id)
    }

    /// Number of targets waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether any target is waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Drop the pending request for `id`.
    pub fn cancel(&self, id: UpdateTargetId) -> Result<()> {
        if self.pending.lock().shift_remove(&id).is_some() {
            tracing::trace!(target: "horizon_notebook_core::scheduler", ?id, "update cancelled");
            Ok(())
        } else {
            Err(SchedulerError::NotPending.into())
        }
    }

    /// Number of flushes performed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// Run one frame: reconcile every pending target once.
    ///
    /// Requests made while the frame is running (for example by a target
    /// whose reconciliation changes another widget) are kept for the next
    /// frame rather than processed in this one.
    ///
    /// Returns the number of targets reconciled.
    #[tracing::instrument(skip(self), target = "horizon_notebook_core::scheduler", level = "trace")]
    pub fn flush(&self) -> usize {
        let batch: Vec<(UpdateTargetId, Weak<dyn UpdateTarget>)> =
            self.pending.lock().drain(..).collect();
        if batch.is_empty() {
            return 0;
        }

        let _span = PerfSpan::new("update_frame");
        let mut reconciled = 0;
        for (id, target) in batch {
            let Some(target) = target.upgrade() else {
                tracing::trace!(target: "horizon_notebook_core::scheduler", ?id, "target dropped before frame");
                continue;
            };
            if target.is_disposed() {
                tracing::trace!(target: "horizon_notebook_core::scheduler", ?id, "target disposed before frame");
                continue;
            }
            target.process_update();
            reconciled += 1;
        }
        self.frames.fetch_add(1, Ordering::SeqCst);

        tracing::trace!(target: "horizon_notebook_core::scheduler", reconciled, "frame flushed");
        reconciled
    }

    /// Wait until at least one update is pending.
    pub async fn next_frame(&self) {
        loop {
            let notified = self.notify.notified();
            if self.has_pending() {
                return;
            }
            notified.await;
        }
    }

    /// Spawn a tokio task that flushes whenever work arrives.
    ///
    /// After the first request of a frame the task waits `coalesce_window`
    /// so that requests arriving in quick succession share the frame. The
    /// task runs until the returned handle is aborted.
    pub fn spawn_frame_loop(
        self: &Arc<Self>,
        coalesce_window: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                scheduler.next_frame().await;
                if !coalesce_window.is_zero() {
                    tokio::time::sleep(coalesce_window).await;
                }
                scheduler.flush();
            }
        })
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("pending", &self.pending_count())
            .field("frames", &self.frame_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(UpdateScheduler: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    struct Counter {
        id: UpdateTargetId,
        updates: AtomicUsize,
        disposed: AtomicBool,
    }

    impl Counter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: UpdateTargetId::next(),
                updates: AtomicUsize::new(0),
                disposed: AtomicBool::new(false),
            })
        }

        fn weak(self: &Arc<Self>) -> Weak<dyn UpdateTarget> {
            let weak: Weak<dyn UpdateTarget> = Arc::downgrade(self) as Weak<dyn UpdateTarget>;
            weak
        }

        fn updates(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    impl UpdateTarget for Counter {
        fn update_target_id(&self) -> UpdateTargetId {
            self.id
        }

        fn is_disposed(&self) -> bool {
            self.disposed.load(Ordering::SeqCst)
        }

        fn process_update(&self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_requests_coalesce() {
        let scheduler = UpdateScheduler::new();
        let target = Counter::new();

        assert!(scheduler.request_update(target.weak()));
        assert!(!scheduler.request_update(target.weak()));
        assert!(!scheduler.request_update(target.weak()));
        assert_eq!(scheduler.pending_count(), 1);

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(target.updates(), 1);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_each_target_reconciled_once() {
        let scheduler = UpdateScheduler::new();
        let a = Counter::new();
        let b = Counter::new();

        scheduler.request_update(a.weak());
        scheduler.request_update(b.weak());
        scheduler.request_update(a.weak());

        assert_eq!(scheduler.flush(), 2);
        assert_eq!(a.updates(), 1);
        assert_eq!(b.updates(), 1);
    }

    #[test]
    fn test_disposed_target_skipped() {
        let scheduler = UpdateScheduler::new();
        let target = Counter::new();

        scheduler.request_update(target.weak());
        target.disposed.store(true, Ordering::SeqCst);

        assert_eq!(scheduler.flush(), 0);
        assert_eq!(target.updates(), 0);
    }

    #[test]
    fn test_dropped_target_skipped() {
        let scheduler = UpdateScheduler::new();
        let target = Counter::new();

        scheduler.request_update(target.weak());
        drop(target);

        assert_eq!(scheduler.flush(), 0);
    }

    #[test]
    fn test_request_for_disposed_target_ignored() {
        let scheduler = UpdateScheduler::new();
        let target = Counter::new();
        target.disposed.store(true, Ordering::SeqCst);

        assert!(!scheduler.request_update(target.weak()));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_cancel() {
        let scheduler = UpdateScheduler::new();
        let target = Counter::new();

        scheduler.request_update(target.weak());
        assert!(scheduler.cancel(target.id).is_ok());
        assert_eq!(
            scheduler.cancel(target.id),
            Err(SchedulerError::NotPending.into())
        );
        assert_eq!(scheduler.flush(), 0);
    }

    #[test]
    fn test_frame_requested_emitted_once_per_frame() {
        let scheduler = UpdateScheduler::new();
        let frames = Arc::new(AtomicUsize::new(0));
        let frames_clone = frames.clone();
        scheduler.frame_requested.connect(move |_| {
            frames_clone.fetch_add(1, Ordering::SeqCst);
        });

        let a = Counter::new();
        let b = Counter::new();
        scheduler.request_update(a.weak());
        scheduler.request_update(b.weak());
        assert_eq!(frames.load(Ordering::SeqCst), 1);

        scheduler.flush();
        scheduler.request_update(a.weak());
        assert_eq!(frames.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.frame_count(), 1);
    }

    /// A target that re-requests itself while being reconciled.
    struct Echo {
        id: UpdateTargetId,
        scheduler: Arc<UpdateScheduler>,
        this: Weak<Echo>,
        updates: AtomicUsize,
    }

    impl UpdateTarget for Echo {
        fn update_target_id(&self) -> UpdateTargetId {
            self.id
        }

        fn is_disposed(&self) -> bool {
            false
        }

        fn process_update(&self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let weak: Weak<dyn UpdateTarget> = self.this.clone() as Weak<dyn UpdateTarget>;
            self.scheduler.request_update(weak);
        }
    }

    #[test]
    fn test_requests_during_flush_wait_for_next_frame() {
        let scheduler = Arc::new(UpdateScheduler::new());
        let echo = Arc::new_cyclic(|this| Echo {
            id: UpdateTargetId::next(),
            scheduler: scheduler.clone(),
            this: this.clone(),
            updates: AtomicUsize::new(0),
        });

        let weak: Weak<dyn UpdateTarget> = Arc::downgrade(&echo) as Weak<dyn UpdateTarget>;
        scheduler.request_update(weak);

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(echo.updates.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_pending(echo.id));

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(echo.updates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_next_frame_wakes_on_request() {
        let scheduler = Arc::new(UpdateScheduler::new());
        let target = Counter::new();

        let waiter = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                scheduler.next_frame().await;
                scheduler.flush()
            })
        };

        tokio::task::yield_now().await;
        scheduler.request_update(target.weak());

        let reconciled = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("frame should be signalled")
            .expect("task should not panic");
        assert_eq!(reconciled, 1);
        assert_eq!(target.updates(), 1);
    }
}
