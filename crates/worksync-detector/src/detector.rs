use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use worksync_core::{
    ChangeProcessor, DetectorConfig, Result, WorkSyncError, WorkspaceChangeEvent,
    WorkspaceChangeKind,
};

use crate::classifier::classify;
use crate::scheduler::{ActivityGuard, DebounceScheduler};

/// Front-end of the change detection pipeline. Receives workspace mutation
/// events serialized through an intake channel, classifies them in arrival
/// order, and hands the resulting impacts to the debounce scheduler. After
/// each event is handled its kind is published on a broadcast channel, which
/// tests and tools use to await "the detector has seen kind K".
pub struct ProjectChangeDetector {
    events: mpsc::UnboundedSender<(WorkspaceChangeEvent, ActivityGuard)>,
    scheduler: DebounceScheduler,
    processed: broadcast::Sender<WorkspaceChangeKind>,
    intake: JoinHandle<()>,
}

impl ProjectChangeDetector {
    pub fn spawn(processor: Arc<dyn ChangeProcessor>, config: DetectorConfig) -> Self {
        let scheduler = DebounceScheduler::new(processor, config.debounce());
        let (events, mut intake_rx) =
            mpsc::unbounded_channel::<(WorkspaceChangeEvent, ActivityGuard)>();
        let (processed, _) = broadcast::channel(64);

        let loop_scheduler = scheduler.clone();
        let loop_processed = processed.clone();
        let intake = tokio::spawn(async move {
            while let Some((event, working)) = intake_rx.recv().await {
                let kind = event.kind;
                match classify(&event) {
                    Ok(impact) => loop_scheduler.apply(impact, &event).await,
                    Err(error) => {
                        warn!(%error, "rejected malformed workspace change event");
                        loop_scheduler.record_error(error);
                    }
                }
                drop(working);
                let _ = loop_processed.send(kind);
            }
            debug!("workspace change intake stopped");
        });

        Self {
            events,
            scheduler,
            processed,
            intake,
        }
    }

    /// Submits one workspace mutation. Never blocks on debounce delays; the
    /// event is classified by the intake loop in arrival order.
    pub fn notify(&self, event: WorkspaceChangeEvent) -> Result<()> {
        let working = self.scheduler.activity_guard();
        self.events
            .send((event, working))
            .map_err(|_| WorkSyncError::Closed)
    }

    /// Event kinds the detector has finished classifying, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceChangeKind> {
        self.processed.subscribe()
    }

    /// Suspends until the intake queue is drained and no target has pending
    /// or in-flight work, surfacing the oldest recorded failure, if any.
    pub async fn wait_until_idle(&self) -> Result<()> {
        self.scheduler.wait_until_idle().await
    }

    /// Cancels all armed debounce windows; already-dispatching work finishes.
    pub fn cancel_pending(&self) {
        self.scheduler.cancel_pending();
    }

    /// The solution is closing: cancel everything and suppress scheduling for
    /// events that are logically part of the closing transition.
    pub fn solution_closing(&self) {
        self.scheduler.begin_closing();
    }

    /// The solution reopened; scheduling resumes.
    pub fn solution_opened(&self) {
        self.scheduler.end_closing();
    }
}

impl Drop for ProjectChangeDetector {
    fn drop(&mut self) {
        self.intake.abort();
        self.scheduler.cancel_pending();
    }
}
