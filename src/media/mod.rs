pub mod config;
pub mod error;
pub mod providers;
pub mod source;
pub mod types;
pub mod url;

pub use config::*;
pub use error::*;
pub use source::MediaSource;
pub use types::*;
pub use url::{ConnectionSpeed, Crop, Format, Quality, TransformOptions, UrlBuilder};

use async_trait::async_trait;
use std::sync::Arc;

/// Largest page the hosted search API hands back in one call.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Receives `(bytes_sent, bytes_total)` while an upload body is streaming.
#[derive(Clone)]
pub struct ProgressReporter(Arc<dyn Fn(u64, u64) + Send + Sync>);

impl ProgressReporter {
    pub fn new(f: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    pub fn report(&self, sent: u64, total: u64) {
        (self.0)(sent, total)
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressReporter")
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Lists a namespace, newest first.
    async fn search(&self, namespace: &str, max_results: usize)
    -> Result<Vec<MediaItem>, MediaError>;

    async fn upload(
        &self,
        file: &SelectedFile,
        namespace: &str,
        progress: ProgressReporter,
    ) -> Result<MediaItem, MediaError>;

    /// Whether `upload` calls its progress reporter with real byte counts.
    fn reports_progress(&self) -> bool {
        false
    }

    fn url_builder(&self) -> UrlBuilder;

    fn name(&self) -> &str;
}

pub type DynMediaStore = Arc<dyn MediaStore>;

pub fn create_store(config: &MediaStoreConfig) -> Result<DynMediaStore, MediaError> {
    match config {
        MediaStoreConfig::Cloudinary(cloudinary) => Ok(Arc::new(
            providers::cloudinary::CloudinaryStore::new(cloudinary)?,
        )),
        MediaStoreConfig::Memory(memory) => Ok(Arc::new(providers::memory::MemoryStore::new(
            memory.cloud_name.clone(),
        ))),
    }
}
