//! Server side of the gallery pages: one [`GalleryPage`] per configured
//! gallery, rendered through the same window and lightbox rules the viewer
//! uses in process.

mod handlers;

pub use handlers::*;

use crate::GalleryPageConfig;
use crate::media::{DynMediaStore, MediaItem, MediaKind, UrlBuilder};
use crate::upload::UploadSubmitter;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

pub type SharedGalleries = Arc<HashMap<String, GalleryPage>>;

#[derive(Clone)]
pub struct GalleryPage {
    pub config: GalleryPageConfig,
    uploads: Option<Arc<UploadSubmitter>>,
}

impl GalleryPage {
    pub fn new(config: GalleryPageConfig, store: DynMediaStore) -> Self {
        let uploads = config.uploads_enabled.then(|| {
            Arc::new(UploadSubmitter::new(
                store,
                config.namespace.clone(),
                config.size_limits,
            ))
        });
        Self { config, uploads }
    }

    pub fn uploads(&self) -> Option<&Arc<UploadSubmitter>> {
        self.uploads.as_ref()
    }

    pub fn teardown(&self) {
        if let Some(uploads) = &self.uploads {
            uploads.teardown();
        }
    }
}

/// A grid tile as templates and the viewer script see it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTile {
    pub index: usize,
    pub id: String,
    pub kind: MediaKind,
    pub is_video: bool,
    pub tile_url: String,
    /// Videos show their poster tile directly.
    pub placeholder_url: Option<String>,
    pub lightbox_url: String,
    pub original_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub uploader: Option<String>,
    pub eager: bool,
}

impl MediaTile {
    pub fn new(
        index: usize,
        item: &MediaItem,
        urls: &UrlBuilder,
        config: &GalleryPageConfig,
    ) -> Self {
        let eager = index < config.eager_tiles;
        Self {
            index,
            id: item.id.clone(),
            kind: item.kind,
            is_video: item.is_video(),
            tile_url: urls.tile(&item.id, item.kind, config.tile_size, eager),
            placeholder_url: (!item.is_video()).then(|| urls.placeholder(&item.id)),
            lightbox_url: urls.lightbox(&item.id, item.kind),
            original_url: item.display_url.clone(),
            width: item.dimensions.map(|d| d.0),
            height: item.dimensions.map(|d| d.1),
            uploader: item.uploader.clone(),
            eager,
        }
    }
}

pub fn tiles(
    items: &[MediaItem],
    offset: usize,
    urls: &UrlBuilder,
    config: &GalleryPageConfig,
) -> Vec<MediaTile> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| MediaTile::new(offset + i, item, urls, config))
        .collect()
}

/// JSON safe to drop inside a `<script>` element.
pub fn embed_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}
