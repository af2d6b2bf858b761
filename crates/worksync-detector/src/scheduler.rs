use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use worksync_core::{
    ChangeProcessor, ProjectId, ProjectUpdate, Result, WorkSyncError, WorkspaceChangeEvent,
    WorkspaceSnapshot,
};

use crate::classifier::ImpactSet;

/// One armed debounce window for a target project. Superseded windows are
/// cancelled, never left to run.
struct PendingWork {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    processor: Arc<dyn ChangeProcessor>,
    debounce: Duration,
    /// target -> armed debounce window; the scheduler is the exclusive owner
    pending: DashMap<ProjectId, PendingWork>,
    /// target -> dispatch section; at most one in-flight dispatch per target
    dispatch_locks: DashMap<ProjectId, Arc<tokio::sync::Mutex<()>>>,
    /// projects a live update has been delivered for; removals drop them
    tracked: Mutex<HashSet<ProjectId>>,
    /// live work units: queued events, armed windows, in-flight dispatches
    active: AtomicUsize,
    idle: Notify,
    errors: Mutex<Vec<WorkSyncError>>,
    closing: AtomicBool,
    generations: AtomicU64,
}

/// Marks one unit of live work; wakes idle waiters when the last unit ends.
pub(crate) struct ActivityGuard {
    inner: Arc<Inner>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Coalesces per-target bursts of impacts into one delayed recomputation
/// each. Every target moves through `Idle -> Pending -> Dispatching -> Idle`;
/// a new impact while Pending resets the debounce window, and a window that
/// elapses while the previous dispatch for the same target is still running
/// waits for it before dispatching.
#[derive(Clone)]
pub struct DebounceScheduler {
    inner: Arc<Inner>,
}

impl DebounceScheduler {
    pub fn new(processor: Arc<dyn ChangeProcessor>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                debounce,
                pending: DashMap::new(),
                dispatch_locks: DashMap::new(),
                tracked: Mutex::new(HashSet::new()),
                active: AtomicUsize::new(0),
                idle: Notify::new(),
                errors: Mutex::new(Vec::new()),
                closing: AtomicBool::new(false),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn activity_guard(&self) -> ActivityGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ActivityGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Applies a classified impact: state-clear removals first, then one
    /// (re-)armed debounce window per target. Suppressed entirely while the
    /// solution is closing.
    pub async fn apply(&self, impact: ImpactSet, event: &WorkspaceChangeEvent) {
        if self.inner.closing.load(Ordering::SeqCst) {
            debug!(kind = ?event.kind, "solution is closing; suppressing impact");
            return;
        }
        if impact.is_empty() {
            return;
        }

        let _working = self.activity_guard();
        let snapshot = Arc::clone(&event.new_snapshot);

        if impact.state_clear {
            self.remove_stale_projects(&event.old_snapshot, &snapshot)
                .await;
        }
        for &target in impact.targets() {
            self.enqueue(target, Arc::clone(&snapshot));
        }
    }

    /// Arms (or re-arms) the debounce window for one target.
    pub fn enqueue(&self, target: ProjectId, snapshot: Arc<WorkspaceSnapshot>) {
        if self.inner.closing.load(Ordering::SeqCst) {
            debug!(project = %target, "solution is closing; refusing to arm a debounce window");
            return;
        }

        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let superseded = self.inner.pending.insert(
            target,
            PendingWork {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = superseded {
            debug!(project = %target, "superseding pending recomputation; window reset");
            previous.cancel.cancel();
        }

        let guard = self.activity_guard();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _working = guard;

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(inner.debounce) => {}
            }

            let lock = dispatch_lock(&inner, target);
            let _section = lock.lock().await;

            // A newer window, a cancellation, or a closing solution may have
            // won while we waited for the section; check again before
            // committing.
            let current = inner
                .pending
                .get(&target)
                .map_or(false, |work| work.generation == generation);
            if !current || cancel.is_cancelled() || inner.closing.load(Ordering::SeqCst) {
                return;
            }
            inner.pending.remove(&target);

            let update = ProjectUpdate {
                project_id: target,
                workspace_project: snapshot.project(target).cloned(),
                snapshot,
            };
            run_dispatch(&inner, target, update).await;
        });
    }

    /// Dispatches one removal update per tracked project that is absent from
    /// the new snapshot, before any fresh window is armed. Ordered by the old
    /// snapshot's project order.
    async fn remove_stale_projects(
        &self,
        old_snapshot: &WorkspaceSnapshot,
        new_snapshot: &Arc<WorkspaceSnapshot>,
    ) {
        let stale: Vec<ProjectId> = {
            let tracked = self.inner.tracked.lock();
            let mut stale: Vec<ProjectId> = old_snapshot
                .project_ids()
                .filter(|&id| tracked.contains(&id) && new_snapshot.project(id).is_none())
                .collect();
            let mut orphaned: Vec<ProjectId> = tracked
                .iter()
                .copied()
                .filter(|&id| old_snapshot.project(id).is_none() && new_snapshot.project(id).is_none())
                .collect();
            orphaned.sort_unstable();
            stale.extend(orphaned);
            stale
        };

        for target in stale {
            if let Some((_, superseded)) = self.inner.pending.remove(&target) {
                superseded.cancel.cancel();
            }
            debug!(project = %target, "project left the workspace; dispatching removal");
            let update = ProjectUpdate {
                project_id: target,
                workspace_project: None,
                snapshot: Arc::clone(new_snapshot),
            };
            let lock = dispatch_lock(&self.inner, target);
            let _section = lock.lock().await;
            run_dispatch(&self.inner, target, update).await;
        }
    }

    /// Cancels every armed window without entering the closing state.
    pub fn cancel_pending(&self) {
        let cancelled = self.inner.pending.len();
        for entry in self.inner.pending.iter() {
            entry.value().cancel.cancel();
        }
        self.inner.pending.clear();
        if cancelled > 0 {
            debug!(cancelled, "cancelled all pending recomputation work");
        }
    }

    /// Cancels all outstanding work, forgets tracked projects, and suppresses
    /// scheduling until [`end_closing`](Self::end_closing).
    pub fn begin_closing(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.cancel_pending();
        self.inner.tracked.lock().clear();
        info!("solution closing; scheduled recomputation cancelled");
    }

    pub fn end_closing(&self) {
        self.inner.closing.store(false, Ordering::SeqCst);
        debug!("solution reopened; scheduling enabled");
    }

    /// Suspends until no target is Pending or Dispatching and no event is
    /// waiting in intake, then surfaces the oldest dispatch failure recorded
    /// since the last call, if any.
    pub async fn wait_until_idle(&self) -> Result<()> {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // register before checking the counter so a wakeup between the
            // check and the await is not lost
            notified.as_mut().enable();
            if self.inner.active.load(Ordering::SeqCst) == 0 {
                break;
            }
            notified.await;
        }

        let mut errors = self.inner.errors.lock();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.remove(0))
        }
    }

    pub(crate) fn record_error(&self, error: WorkSyncError) {
        self.inner.errors.lock().push(error);
    }
}

fn dispatch_lock(inner: &Inner, target: ProjectId) -> Arc<tokio::sync::Mutex<()>> {
    let entry = inner.dispatch_locks.entry(target).or_default();
    Arc::clone(entry.value())
}

/// Runs the processor for one settled update. The caller holds the target's
/// dispatch section. Failures are recorded for the next idle waiter; the
/// target returns to Idle either way.
async fn run_dispatch(inner: &Inner, target: ProjectId, update: ProjectUpdate) {
    let removal = update.is_removal();
    match inner.processor.on_update(update).await {
        Ok(()) => {
            let mut tracked = inner.tracked.lock();
            if removal {
                tracked.remove(&target);
            } else {
                tracked.insert(target);
            }
        }
        Err(error) => {
            warn!(project = %target, %error, "project update dispatch failed");
            inner
                .errors
                .lock()
                .push(WorkSyncError::Dispatch(format!("project {target}: {error}")));
        }
    }
}
