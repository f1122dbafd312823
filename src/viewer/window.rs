use crate::media::MediaItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Distance from the bottom of the page, in pixels, at which scrolling asks
/// for the next batch.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Items shown before any extension.
    pub initial_batch: usize,
    /// Items appended per extension.
    pub increment: usize,
    /// Pause between starting and completing an extension. The data is
    /// already local; some pages still wait to smooth the reveal.
    #[serde(default, with = "millis")]
    pub extend_delay: Duration,
}

impl WindowConfig {
    pub fn uniform(batch: usize) -> Self {
        Self {
            initial_batch: batch,
            increment: batch,
            extend_delay: Duration::ZERO,
        }
    }

    pub fn with_increment(mut self, increment: usize) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.extend_delay = delay;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::uniform(20)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Idle,
    Extending,
}

/// Page position reported by a scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub viewport_height: f64,
    pub scroll_y: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.viewport_height + self.scroll_y >= self.document_height - threshold
    }
}

/// The prefix of a gallery's media list currently shown to the visitor.
///
/// `visible_count` never shrinks and never exceeds the list length. Only one
/// extension can be in flight; requests that arrive meanwhile are dropped.
#[derive(Debug, Clone)]
pub struct BatchWindow {
    all: Vec<MediaItem>,
    visible: usize,
    phase: WindowPhase,
    config: WindowConfig,
    scroll_threshold: f64,
}

impl BatchWindow {
    pub fn new(all: Vec<MediaItem>, config: WindowConfig) -> Self {
        let visible = all.len().min(config.initial_batch);
        Self {
            all,
            visible,
            phase: WindowPhase::Idle,
            config,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }

    /// Rebuilds a window a client already grew to `visible` items.
    pub fn resume(all: Vec<MediaItem>, config: WindowConfig, visible: usize) -> Self {
        let mut window = Self::new(all, config);
        window.visible = window.visible.max(visible.min(window.all.len()));
        window
    }

    pub fn with_scroll_threshold(mut self, threshold: f64) -> Self {
        self.scroll_threshold = threshold;
        self
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn all(&self) -> &[MediaItem] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn visible(&self) -> &[MediaItem] {
        &self.all[..self.visible]
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn phase(&self) -> WindowPhase {
        self.phase
    }

    /// True once everything is on screen; the "load more" control goes away.
    pub fn is_exhausted(&self) -> bool {
        self.visible == self.all.len()
    }

    pub fn has_more(&self) -> bool {
        !self.is_exhausted()
    }

    /// Idle -> Extending when there is something left to show.
    pub fn request_extend(&mut self) -> bool {
        if self.phase == WindowPhase::Extending || self.is_exhausted() {
            return false;
        }
        self.phase = WindowPhase::Extending;
        true
    }

    /// Extending -> Idle, appending the next batch. Returns the newly shown
    /// items' range.
    pub fn complete_extend(&mut self) -> std::ops::Range<usize> {
        if self.phase != WindowPhase::Extending {
            return self.visible..self.visible;
        }
        let start = self.visible;
        self.visible = (self.visible + self.config.increment.max(1)).min(self.all.len());
        self.phase = WindowPhase::Idle;
        start..self.visible
    }

    /// Runs a whole extension, waiting out the configured delay.
    pub async fn extend(&mut self) -> std::ops::Range<usize> {
        if !self.request_extend() {
            return self.visible..self.visible;
        }
        if !self.config.extend_delay.is_zero() {
            tokio::time::sleep(self.config.extend_delay).await;
        }
        self.complete_extend()
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        metrics.near_bottom(self.scroll_threshold) && self.request_extend()
    }

    pub fn on_sentinel_visible(&mut self) -> bool {
        self.request_extend()
    }

    /// Puts a fresh upload at the front. The window grows by one so nothing
    /// already on screen drops out. Returns false for an id already present.
    pub fn prepend(&mut self, item: MediaItem) -> bool {
        if self.all.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        self.all.insert(0, item);
        self.visible += 1;
        true
    }
}
