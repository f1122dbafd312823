use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock;
use tracing::info;

use crate::media::{
    MediaError, MediaItem, MediaStore, ProgressReporter, SelectedFile, TransformOptions,
    UrlBuilder,
};

/// Keeps media in process. Used for local runs without CDN credentials and
/// by the test suite, which can also make it fail on demand.
pub struct MemoryStore {
    cloud_name: String,
    namespaces: RwLock<HashMap<String, Vec<MediaItem>>>,
    search_failure: RwLock<Option<String>>,
    failing_uploads: RwLock<HashSet<String>>,
    upload_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            namespaces: RwLock::new(HashMap::new()),
            search_failure: RwLock::new(None),
            failing_uploads: RwLock::new(HashSet::new()),
            upload_calls: AtomicUsize::new(0),
        }
    }

    /// Adds an item as the newest entry of a namespace.
    pub async fn insert(&self, namespace: &str, item: MediaItem) {
        self.namespaces
            .write()
            .await
            .entry(namespace.to_string())
            .or_default()
            .insert(0, item);
    }

    pub async fn fail_searches(&self, reason: Option<String>) {
        *self.search_failure.write().await = reason;
    }

    pub async fn fail_uploads_named(&self, file_name: &str) {
        self.failing_uploads
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Number of upload calls that reached the store.
    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn search(
        &self,
        namespace: &str,
        max_results: usize,
    ) -> Result<Vec<MediaItem>, MediaError> {
        if let Some(reason) = self.search_failure.read().await.clone() {
            return Err(MediaError::RemoteStatus {
                status: 500,
                body: reason,
            });
        }

        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace.trim_matches('/'))
            .map(|items| items.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }

    async fn upload(
        &self,
        file: &SelectedFile,
        namespace: &str,
        progress: ProgressReporter,
    ) -> Result<MediaItem, MediaError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_uploads.read().await.contains(&file.name) {
            return Err(MediaError::UploadFailed(format!(
                "{} was rejected",
                file.name
            )));
        }

        progress.report(file.size(), file.size());

        let kind = file.kind();
        let id = format!("{}/{}", namespace.trim_matches('/'), uuid::Uuid::new_v4());
        let display_url = self
            .url_builder()
            .build(&id, kind, &TransformOptions::default());
        let item = MediaItem::new(id, kind, display_url);

        info!("Stored {} in memory namespace {}", file.name, namespace);
        self.insert(namespace.trim_matches('/'), item.clone()).await;
        Ok(item)
    }

    fn url_builder(&self) -> UrlBuilder {
        UrlBuilder::new(self.cloud_name.clone())
    }

    fn name(&self) -> &str {
        "In-memory media store"
    }
}
