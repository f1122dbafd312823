//! Guest upload submission.
//!
//! Each selected file becomes a task on the board. Oversized files fail on
//! the spot without touching the network; the rest are uploaded concurrently
//! and independently. Terminal tasks leave the board after a short linger.

mod board;
mod error;
mod types;

pub use board::TaskBoard;
pub use error::UploadError;
pub use types::*;

use crate::media::{DynMediaStore, MediaItem, ProgressReporter, SelectedFile};
use rand::Rng;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type SuccessCallback = Arc<dyn Fn(MediaItem) + Send + Sync>;

pub struct UploadSubmitter {
    store: DynMediaStore,
    namespace: String,
    limits: SizeLimits,
    timings: UploadTimings,
    board: TaskBoard,
    shutdown: CancellationToken,
}

enum Pending {
    Ready(UploadOutcome),
    Running(Uuid, String, JoinHandle<UploadOutcome>),
}

/// Handle on the files of one selection.
pub struct Submission {
    pending: Vec<Pending>,
}

impl Submission {
    pub fn task_ids(&self) -> Vec<Uuid> {
        self.pending
            .iter()
            .map(|p| match p {
                Pending::Ready(outcome) => outcome.task_id,
                Pending::Running(id, _, _) => *id,
            })
            .collect()
    }

    /// Waits for every file to settle, in selection order.
    pub async fn wait(self) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            match pending {
                Pending::Ready(outcome) => outcomes.push(outcome),
                Pending::Running(task_id, file_name, handle) => match handle.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        error!("Upload task for {} panicked: {}", file_name, e);
                        outcomes.push(UploadOutcome {
                            task_id,
                            file_name,
                            status: TaskStatus::Failed,
                            error_reason: Some("Upload failed".to_string()),
                            item: None,
                        });
                    }
                },
            }
        }
        outcomes
    }
}

impl UploadSubmitter {
    pub fn new(store: DynMediaStore, namespace: impl Into<String>, limits: SizeLimits) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            limits,
            timings: UploadTimings::default(),
            board: TaskBoard::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_timings(mut self, timings: UploadTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancels every progress and cleanup timer. Requests already on the wire
    /// run to completion but their results are dropped.
    pub fn teardown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Tearing down uploads for namespace '{}'", self.namespace);
            self.shutdown.cancel();
        }
    }

    pub fn submit(
        &self,
        files: Vec<SelectedFile>,
        on_success: impl Fn(MediaItem) + Send + Sync + 'static,
    ) -> Submission {
        let on_success: SuccessCallback = Arc::new(on_success);
        info!(
            "Uploading {} file{} to '{}'",
            files.len(),
            if files.len() == 1 { "" } else { "s" },
            self.namespace
        );

        let pending = files
            .into_iter()
            .map(|file| self.submit_one(file, on_success.clone()))
            .collect();

        Submission { pending }
    }

    fn submit_one(&self, file: SelectedFile, on_success: SuccessCallback) -> Pending {
        let source = if self.store.reports_progress() {
            ProgressSource::Measured
        } else {
            ProgressSource::Simulated
        };
        let task = UploadTask::new(file.name.clone(), source);
        let task_id = task.id;
        self.board.insert(task);

        let kind = file.kind();
        if file.size() > self.limits.ceiling(kind) {
            let reason = self.limits.too_large_reason(kind);
            warn!(
                "Rejecting {} ({} bytes): {}",
                file.name,
                file.size(),
                reason
            );
            self.board.update(task_id, |t| {
                t.fail(reason.clone());
            });
            self.schedule_removal(task_id, self.timings.failure_linger);
            return Pending::Ready(UploadOutcome {
                task_id,
                file_name: file.name,
                status: TaskStatus::Failed,
                error_reason: Some(reason),
                item: None,
            });
        }

        let ticker = CancellationToken::new();
        let reporter = match source {
            ProgressSource::Simulated => {
                self.spawn_simulated_progress(task_id, ticker.clone());
                ProgressReporter::noop()
            }
            ProgressSource::Measured => {
                let board = self.board.clone();
                let cap = self.timings.measured_ceiling;
                ProgressReporter::new(move |sent, total| {
                    if total > 0 {
                        let percent = sent as f32 / total as f32 * 100.0;
                        board.update(task_id, |t| t.advance_to(percent, cap));
                    }
                })
            }
        };

        let store = self.store.clone();
        let namespace = self.namespace.clone();
        let board = self.board.clone();
        let shutdown = self.shutdown.clone();
        let timings = self.timings;
        let file_name = file.name.clone();

        let handle = tokio::spawn(async move {
            let result = store.upload(&file, &namespace, reporter).await;
            ticker.cancel();

            if shutdown.is_cancelled() {
                debug!(
                    "Upload of {} finished after teardown, dropping result",
                    file.name
                );
                let (status, error_reason) = match &result {
                    Ok(_) => (TaskStatus::Succeeded, None),
                    Err(e) => (TaskStatus::Failed, Some(e.to_string())),
                };
                return UploadOutcome {
                    task_id,
                    file_name: file.name,
                    status,
                    error_reason,
                    item: None,
                };
            }

            match result {
                Ok(item) => {
                    board.update(task_id, |t| {
                        t.succeed();
                    });
                    info!("{} uploaded as {}", file.name, item.id);
                    on_success(item.clone());
                    schedule_removal(&board, &shutdown, task_id, timings.success_linger);
                    UploadOutcome {
                        task_id,
                        file_name: file.name,
                        status: TaskStatus::Succeeded,
                        error_reason: None,
                        item: Some(item),
                    }
                }
                Err(e) => {
                    error!("Failed to upload {}: {}", file.name, e);
                    let reason = "Upload failed".to_string();
                    board.update(task_id, |t| {
                        t.fail(reason.clone());
                    });
                    schedule_removal(&board, &shutdown, task_id, timings.failure_linger);
                    UploadOutcome {
                        task_id,
                        file_name: file.name,
                        status: TaskStatus::Failed,
                        error_reason: Some(reason),
                        item: None,
                    }
                }
            }
        });

        Pending::Running(task_id, file_name, handle)
    }

    fn spawn_simulated_progress(&self, task_id: Uuid, ticker: CancellationToken) {
        let board = self.board.clone();
        let shutdown = self.shutdown.clone();
        let timings = self.timings;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(timings.tick);
            interval.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.cancelled() => break,
                    _ = interval.tick() => {
                        let step = rand::rng().random_range(timings.step_min..timings.step_max);
                        let still_there = board.update(task_id, |t| {
                            let next = t.progress_percent + step;
                            t.advance_to(next, timings.simulated_ceiling);
                        });
                        if !still_there {
                            break;
                        }
                    }
                }
            }
        });
    }

    fn schedule_removal(&self, task_id: Uuid, linger: Duration) {
        schedule_removal(&self.board, &self.shutdown, task_id, linger);
    }
}

impl Drop for UploadSubmitter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn schedule_removal(
    board: &TaskBoard,
    shutdown: &CancellationToken,
    task_id: Uuid,
    linger: Duration,
) {
    // Deadline is fixed now, not when the timer task first runs
    let sleep = tokio::time::sleep(linger);
    let board = board.clone();
    let shutdown = shutdown.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = sleep => {
                board.remove(task_id);
            }
        }
    });
}
