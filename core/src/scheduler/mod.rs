//! Serialized backup-then-replace saves.
//!
//! Saves are queued per target key and started in submission order, at
//! most one in flight per target. Different targets proceed
//! concurrently; nothing orders them against each other. The scheduler
//! never retries on its own.

pub mod task;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

pub use task::{FileStore, LocalStore, RemoteStore, UploadState, UploadTask};

struct QueuedSave {
    task: UploadTask,
    done: oneshot::Sender<UploadState>,
}

#[derive(Default)]
struct TargetQueue {
    pending: VecDeque<QueuedSave>,
    in_flight: bool,
}

/// Per-target FIFO queues for [`UploadTask`]s.
#[derive(Clone)]
pub struct UploadScheduler {
    queues: Arc<Mutex<HashMap<String, TargetQueue>>>,
    max_retries: u32,
}

impl UploadScheduler {
    pub fn new(max_retries: u32) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            max_retries,
        }
    }

    /// Enqueue a save under a target key. The returned receiver yields
    /// the terminal state; it errors when the save is cancelled before
    /// it starts.
    ///
    /// Tasks whose retry count already exceeds the configured threshold
    /// are rejected here and complete `Failed` without running.
    pub async fn schedule_save(
        &self,
        target: impl Into<String>,
        task: UploadTask,
    ) -> oneshot::Receiver<UploadState> {
        let target = target.into();
        let (tx, rx) = oneshot::channel();

        if task.retry_count() > self.max_retries {
            warn!(
                target = %target,
                retries = task.retry_count(),
                "save exceeded the retry threshold, rejecting"
            );
            let _ = tx.send(UploadState::Failed);
            return rx;
        }

        let mut queues = self.queues.lock().await;
        queues
            .entry(target)
            .or_default()
            .pending
            .push_back(QueuedSave { task, done: tx });
        rx
    }

    /// Start at most one pending save per idle target.
    pub async fn dispatch_ready(&self) {
        let mut queues = self.queues.lock().await;
        let targets: Vec<String> = queues
            .iter()
            .filter(|(_, q)| !q.in_flight && !q.pending.is_empty())
            .map(|(t, _)| t.clone())
            .collect();

        for target in targets {
            let Some(queue) = queues.get_mut(&target) else {
                continue;
            };
            let Some(next) = queue.pending.pop_front() else {
                continue;
            };
            queue.in_flight = true;
            debug!(target = %target, "starting save");

            let scheduler = self.clone();
            tokio::spawn(async move {
                let QueuedSave { mut task, done } = next;
                let state = task.run().await;
                // Release the target before signalling completion, so a
                // caller reacting to the signal can dispatch again.
                scheduler.finish(&target).await;
                let _ = done.send(state);
            });
        }
    }

    async fn finish(&self, target: &str) {
        let mut queues = self.queues.lock().await;
        if let Some(queue) = queues.get_mut(target) {
            queue.in_flight = false;
            if queue.pending.is_empty() {
                queues.remove(target);
            }
        }
    }

    /// Drop queued-but-unstarted saves for a target. Their receivers
    /// observe the drop as a cancelled channel. An in-flight save is
    /// not interrupted.
    pub async fn cancel_pending(&self, target: &str) -> usize {
        let mut queues = self.queues.lock().await;
        let Some(queue) = queues.get_mut(target) else {
            return 0;
        };
        let dropped = queue.pending.len();
        queue.pending.clear();
        if !queue.in_flight {
            queues.remove(target);
        }
        dropped
    }

    /// Pending (unstarted) saves for a target.
    pub async fn pending_count(&self, target: &str) -> usize {
        self.queues
            .lock()
            .await
            .get(target)
            .map(|q| q.pending.len())
            .unwrap_or(0)
    }

    /// Drive [`dispatch_ready`](Self::dispatch_ready) from a background
    /// ticker. Abort the handle at shutdown.
    pub fn spawn_dispatcher(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                scheduler.dispatch_ready().await;
            }
        })
    }
}
