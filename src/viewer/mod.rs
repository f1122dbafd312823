//! The paged media viewer shared by every gallery page.

pub mod lightbox;
pub mod window;

pub use lightbox::{DetachedHost, Key, Lightbox, LightboxHost, next_index, prev_index};
pub use window::{BatchWindow, ScrollMetrics, WindowConfig, WindowPhase};

use crate::GalleryPageConfig;
use crate::media::{FetchOutcome, MediaItem, MediaSource};
use tokio::sync::mpsc;
use tracing::debug;

/// One gallery page's viewer state: the fetched list, the visible window,
/// the lightbox, and the intake for finished uploads.
pub struct GalleryViewer<H: LightboxHost> {
    config: GalleryPageConfig,
    window: BatchWindow,
    lightbox: Lightbox,
    host: H,
    fetch_failure: Option<String>,
    uploads_tx: mpsc::UnboundedSender<MediaItem>,
    uploads_rx: mpsc::UnboundedReceiver<MediaItem>,
}

impl<H: LightboxHost> GalleryViewer<H> {
    pub async fn load(config: GalleryPageConfig, source: &MediaSource, host: H) -> Self {
        let outcome = source.fetch_all(&config.namespace, config.max_results).await;
        Self::from_outcome(config, outcome, host)
    }

    pub fn from_outcome(config: GalleryPageConfig, outcome: FetchOutcome, host: H) -> Self {
        let fetch_failure = match &outcome {
            FetchOutcome::FetchFailed(reason) => Some(reason.clone()),
            _ => None,
        };
        let window = BatchWindow::new(outcome.into_items(), config.window);
        let (uploads_tx, uploads_rx) = mpsc::unbounded_channel();

        Self {
            config,
            window,
            lightbox: Lightbox::new(),
            host,
            fetch_failure,
            uploads_tx,
            uploads_rx,
        }
    }

    pub fn config(&self) -> &GalleryPageConfig {
        &self.config
    }

    pub fn window(&self) -> &BatchWindow {
        &self.window
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Set when the list could not be fetched, so the page can offer a retry.
    pub fn fetch_failure(&self) -> Option<&str> {
        self.fetch_failure.as_deref()
    }

    pub fn visible(&self) -> &[MediaItem] {
        self.window.visible()
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.lightbox
            .selected()
            .and_then(|index| self.window.visible().get(index))
    }

    pub fn open(&mut self, index: usize) -> bool {
        let len = self.window.visible_count();
        self.lightbox.open(index, len, &mut self.host)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.lightbox.next(self.window.visible_count())
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.lightbox.prev(self.window.visible_count())
    }

    pub fn close(&mut self) {
        self.lightbox.close(&mut self.host);
    }

    pub fn key(&mut self, key: Key) -> bool {
        let len = self.window.visible_count();
        self.lightbox.handle_key(key, len, &mut self.host)
    }

    pub fn media_loaded(&mut self) {
        self.lightbox.media_loaded();
    }

    pub fn media_failed(&mut self) {
        self.lightbox.media_failed();
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        self.window.on_scroll(metrics)
    }

    pub fn on_sentinel_visible(&mut self) -> bool {
        self.window.on_sentinel_visible()
    }

    pub fn complete_extend(&mut self) -> std::ops::Range<usize> {
        self.window.complete_extend()
    }

    /// "Load more" button.
    pub async fn load_more(&mut self) -> std::ops::Range<usize> {
        self.window.extend().await
    }

    /// Callback to hand to the upload submitter.
    pub fn upload_sink(&self) -> impl Fn(MediaItem) + Send + Sync + 'static {
        let tx = self.uploads_tx.clone();
        move |item| {
            // The viewer is gone if this fails; nothing left to update
            let _ = tx.send(item);
        }
    }

    /// Prepends uploads that finished since the last call. Returns how many
    /// were added.
    pub fn poll_uploads(&mut self) -> usize {
        let mut added = 0;
        while let Ok(item) = self.uploads_rx.try_recv() {
            if self.accept_upload(item) {
                added += 1;
            }
        }
        added
    }

    pub fn accept_upload(&mut self, item: MediaItem) -> bool {
        debug!("Prepending {} to '{}'", item.id, self.config.name);
        if self.window.prepend(item) {
            self.lightbox.shift_for_prepend();
            true
        } else {
            false
        }
    }

    /// Page is going away; undo anything the lightbox did to the host.
    pub fn teardown(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::lightbox::tests::RecordingHost;
    use super::*;
    use crate::media::{MediaKind, SelectedFile, providers::memory::MemoryStore};
    use crate::upload::{SizeLimits, TaskStatus, UploadSubmitter};
    use std::sync::Arc;

    fn page(batch: usize) -> GalleryPageConfig {
        GalleryPageConfig::new("guest-gallery", "Guest Gallery", "wedding-gallery")
            .with_window(WindowConfig::uniform(batch))
    }

    fn items(n: usize) -> Vec<MediaItem> {
        (0..n)
            .map(|i| MediaItem::new(format!("w/{}", i), MediaKind::Image, format!("u{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_load_records_failure() {
        let store = Arc::new(MemoryStore::new("demo"));
        store.fail_searches(Some("503".to_string())).await;
        let source = MediaSource::new(store);

        let viewer = GalleryViewer::load(page(20), &source, RecordingHost::default()).await;
        assert!(viewer.fetch_failure().is_some());
        assert!(viewer.visible().is_empty());
        assert!(viewer.window().is_exhausted());
    }

    #[test]
    fn test_open_extend_then_next_uses_new_length() {
        let outcome = FetchOutcome::from_items(items(25));
        let mut viewer = GalleryViewer::from_outcome(page(20), outcome, RecordingHost::default());

        assert!(viewer.open(17));
        assert!(viewer.on_sentinel_visible());
        assert_eq!(viewer.complete_extend(), 20..25);

        for _ in 0..6 {
            viewer.next();
        }
        assert_eq!(viewer.lightbox().selected(), Some((17 + 6) % 25));
        assert_eq!(viewer.current().unwrap().id, "w/23");
    }

    #[test]
    fn test_prepend_keeps_lightbox_on_same_item() {
        let outcome = FetchOutcome::from_items(items(5));
        let mut viewer = GalleryViewer::from_outcome(page(20), outcome, RecordingHost::default());
        viewer.open(2);
        assert_eq!(viewer.current().unwrap().id, "w/2");

        assert!(viewer.accept_upload(MediaItem::new("w/new", MediaKind::Image, "n")));
        assert_eq!(viewer.current().unwrap().id, "w/2");
        assert_eq!(viewer.visible()[0].id, "w/new");
    }

    #[test]
    fn test_teardown_restores_scroll() {
        let outcome = FetchOutcome::from_items(items(3));
        let mut viewer = GalleryViewer::from_outcome(page(20), outcome, RecordingHost::default());
        viewer.open(0);
        viewer.key(Key::Right);
        assert!(viewer.host().scroll_locked);

        viewer.teardown();
        viewer.teardown();
        assert!(!viewer.host().scroll_locked);
        assert_eq!(viewer.host().restore_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_from_one_gesture_land_once() {
        let store = Arc::new(MemoryStore::new("demo"));
        store.fail_uploads_named("blurry.jpg").await;
        let outcome = FetchOutcome::from_items(items(3));
        let mut viewer = GalleryViewer::from_outcome(page(20), outcome, RecordingHost::default());

        let submitter = UploadSubmitter::new(store, "wedding-gallery", SizeLimits::default());
        let outcomes = submitter
            .submit(
                vec![
                    SelectedFile::new("cake.jpg", "image/jpeg", vec![1u8; 32]),
                    SelectedFile::new("blurry.jpg", "image/jpeg", vec![2u8; 32]),
                ],
                viewer.upload_sink(),
            )
            .wait()
            .await;

        assert_eq!(viewer.poll_uploads(), 1);
        assert_eq!(viewer.poll_uploads(), 0);

        let uploaded = outcomes[0].item.as_ref().unwrap();
        let hits = viewer
            .visible()
            .iter()
            .filter(|item| item.id == uploaded.id)
            .count();
        assert_eq!(hits, 1);
        assert_eq!(viewer.visible()[0].id, uploaded.id);
        assert_eq!(outcomes[1].status, TaskStatus::Failed);
        assert_eq!(viewer.visible().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_button() {
        let config = page(2).with_window(
            WindowConfig::uniform(2).with_delay(std::time::Duration::from_millis(300)),
        );
        let outcome = FetchOutcome::from_items(items(3));
        let mut viewer = GalleryViewer::from_outcome(config, outcome, RecordingHost::default());

        assert_eq!(viewer.load_more().await, 2..3);
        assert!(viewer.window().is_exhausted());
        assert_eq!(viewer.load_more().await, 3..3);
    }
}
