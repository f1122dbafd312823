#![allow(dead_code)]

use axum_test::TestServer;
use std::{path::PathBuf, sync::Arc};
use wedding_site::{
    AppState, Config, GalleryPageConfig, create_router,
    media::{DynMediaStore, MediaItem, MediaKind, providers::memory::MemoryStore},
    rsvp::{DynRsvpStore, providers::memory::MemoryRsvpStore},
};

pub struct TestSite {
    pub server: TestServer,
    pub media: Arc<MemoryStore>,
    pub rsvps: Arc<MemoryRsvpStore>,
}

fn repo_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
}

/// Config pointing at the repository's own templates and static files.
pub fn site_config() -> Config {
    let mut config = Config::default();
    config.templates.directory = repo_dir("templates");
    config.static_files.directory = repo_dir("static");
    config
}

pub fn start(config: Config) -> TestSite {
    let media = Arc::new(MemoryStore::new("demo"));
    let rsvps = Arc::new(MemoryRsvpStore::new());

    let media_store: DynMediaStore = media.clone();
    let rsvp_store: DynRsvpStore = rsvps.clone();
    let app_state = AppState::with_stores(config, media_store, rsvp_store);
    let server = TestServer::new(create_router(app_state)).unwrap();

    TestSite {
        server,
        media,
        rsvps,
    }
}

pub fn start_default() -> TestSite {
    start(site_config())
}

pub fn start_with_gallery(gallery: GalleryPageConfig) -> TestSite {
    let mut config = site_config();
    config.galleries.push(gallery);
    start(config)
}

/// Inserts `count` images so that `<namespace>/0` ends up newest.
pub async fn seed_images(media: &MemoryStore, namespace: &str, count: usize) {
    for i in (0..count).rev() {
        let id = format!("{}/{}", namespace, i);
        media
            .insert(
                namespace,
                MediaItem::new(id.clone(), MediaKind::Image, format!("https://cdn.test/{}", id)),
            )
            .await;
    }
}
