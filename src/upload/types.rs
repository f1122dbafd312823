use crate::media::{MediaItem, MediaKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const MIB: u64 = 1024 * 1024;

/// Per-kind upload ceilings in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub image_bytes: u64,
    pub video_bytes: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            image_bytes: 10 * MIB,
            video_bytes: 100 * MIB,
        }
    }
}

impl SizeLimits {
    pub fn ceiling(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.image_bytes,
            MediaKind::Video => self.video_bytes,
        }
    }

    /// Human readable ceiling, e.g. `10MB`.
    pub fn describe(&self, kind: MediaKind) -> String {
        let bytes = self.ceiling(kind);
        if bytes >= MIB && bytes % MIB == 0 {
            format!("{}MB", bytes / MIB)
        } else {
            format!("{} bytes", bytes)
        }
    }

    pub fn too_large_reason(&self, kind: MediaKind) -> String {
        format!("File too large (max {})", self.describe(kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::InProgress)
    }
}

/// Where a task's progress figure comes from. Simulated progress is an
/// estimate that creeps toward a ceiling until the request resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressSource {
    Measured,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTask {
    pub id: Uuid,
    pub file_name: String,
    pub progress_percent: f32,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub progress_source: ProgressSource,
}

impl UploadTask {
    pub fn new(file_name: impl Into<String>, progress_source: ProgressSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            progress_percent: 0.0,
            status: TaskStatus::InProgress,
            error_reason: None,
            progress_source,
        }
    }

    /// Moves progress forward, never backward, never past `cap`.
    pub fn advance_to(&mut self, percent: f32, cap: f32) {
        if self.status.is_terminal() {
            return;
        }
        let target = percent.min(cap).clamp(0.0, 100.0);
        if target > self.progress_percent {
            self.progress_percent = target;
        }
    }

    pub fn succeed(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Succeeded;
        self.progress_percent = 100.0;
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.progress_percent = 100.0;
        self.error_reason = Some(reason.into());
        true
    }
}

/// Timer settings for progress simulation and task cleanup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadTimings {
    pub tick: Duration,
    pub simulated_ceiling: f32,
    pub step_min: f32,
    pub step_max: f32,
    /// Measured progress holds below this until the response arrives.
    pub measured_ceiling: f32,
    pub success_linger: Duration,
    pub failure_linger: Duration,
}

impl Default for UploadTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(400),
            simulated_ceiling: 85.0,
            step_min: 8.0,
            step_max: 20.0,
            measured_ceiling: 99.0,
            success_linger: Duration::from_millis(1500),
            failure_linger: Duration::from_secs(3),
        }
    }
}

/// Final word on one file of a submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub task_id: Uuid,
    pub file_name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<MediaItem>,
}
