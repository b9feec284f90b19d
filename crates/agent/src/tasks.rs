//! Pin task polling and the bounded handler pool.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cairn_coordinator::{Coordinator, PinStatus, PinTask, RegisteredSession};
use cairn_ipfs_api::StorageApi;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::metrics::AgentMetrics;

/// Runs pin handlers with a concurrency cap and at most one handler per task id.
pub(crate) struct PinPool<C> {
    storage: Arc<dyn StorageApi>,
    session: Arc<RegisteredSession<C>>,
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    tracker: TaskTracker,
    metrics: AgentMetrics,
}

impl<C: Coordinator + 'static> PinPool<C> {
    pub(crate) fn new(
        storage: Arc<dyn StorageApi>,
        session: Arc<RegisteredSession<C>>,
        max_concurrent: usize,
        metrics: AgentMetrics,
    ) -> Self {
        Self {
            storage,
            session,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::default(),
            tracker: TaskTracker::new(),
            metrics,
        }
    }

    /// Handlers spawned and not yet finished.
    pub(crate) fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Hand `task` to a handler, waiting for a free slot first.
    ///
    /// Returns `false` if `cancel` fired while waiting; the task is not run.
    pub(crate) async fn dispatch(&self, task: PinTask, cancel: &CancellationToken) -> bool {
        let Some(claim) = Claim::acquire(&self.in_flight, &task.task_id) else {
            debug!(task_id = %task.task_id, "task already in flight, skipping");
            return true;
        };

        let permit = tokio::select! {
            _ = cancel.cancelled() => return false,
            permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return false,
            },
        };

        let storage = Arc::clone(&self.storage);
        let session = Arc::clone(&self.session);
        let metrics = self.metrics.clone();
        self.tracker.spawn(async move {
            let _permit = permit;
            let _claim = claim;
            let _gauge = metrics.pin_started();
            process_task(storage.as_ref(), &session, &task, &metrics).await;
        });
        true
    }

    /// Stop accepting handlers and wait up to `grace` for running ones.
    ///
    /// Returns the number of handlers still running at the deadline. They are
    /// left to finish in the background.
    pub(crate) async fn shutdown(&self, grace: Duration) -> usize {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending == 0 {
            return 0;
        }

        info!(pending, grace = ?grace, "waiting for in-flight pin tasks");
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => 0,
            Err(_) => {
                let abandoned = self.tracker.len();
                warn!(abandoned, "pin tasks still running after shutdown grace period");
                abandoned
            }
        }
    }
}

/// Pin one task and report its outcome exactly once.
async fn process_task<C: Coordinator>(
    storage: &dyn StorageApi,
    session: &RegisteredSession<C>,
    task: &PinTask,
    metrics: &AgentMetrics,
) {
    info!(task_id = %task.task_id, cid = %task.cid, "pinning content");

    let outcome = storage.pin(&task.cid).await;
    let status = PinStatus::from_outcome(&outcome);
    if let Err(e) = &outcome {
        error!(task_id = %task.task_id, cid = %task.cid, error = %e, "failed to pin content");
    }
    metrics.pin_outcome(status == PinStatus::Pinned);

    match session.report_pin_status(&task.task_id, status).await {
        Ok(()) if status == PinStatus::Pinned => {
            info!(task_id = %task.task_id, "pin task completed");
        }
        Ok(()) => {}
        Err(e) => {
            error!(task_id = %task.task_id, %status, error = %e, "failed to report pin status");
            metrics.status_reports_failed_total.increment(1);
        }
    }
}

/// Poll for tasks every `period` and feed them to `pool` until `cancel` fires.
pub(crate) async fn poll_loop<C: Coordinator + 'static>(
    pool: &PinPool<C>,
    period: Duration,
    cancel: &CancellationToken,
    metrics: &AgentMetrics,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'poll: loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let tasks = tokio::select! {
            _ = cancel.cancelled() => break,
            tasks = pool.session.get_pin_tasks() => tasks,
        };
        let tasks = match tasks {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "failed to poll for tasks");
                metrics.task_polls_failed_total.increment(1);
                continue;
            }
        };

        for task in tasks {
            info!(task_id = %task.task_id, cid = %task.cid, "received pin task");
            if !pool.dispatch(task, cancel).await {
                break 'poll;
            }
        }
    }
    debug!(in_flight = pool.in_flight(), "task poll loop stopped");
}

/// Marks a task id as in flight until dropped.
struct Claim {
    set: Arc<Mutex<HashSet<String>>>,
    task_id: String,
}

impl Claim {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, task_id: &str) -> Option<Self> {
        if !set.lock().insert(task_id.to_string()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            task_id: task_id.to_string(),
        })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.set.lock().remove(&self.task_id);
    }
}
