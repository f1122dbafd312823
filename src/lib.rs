use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;

pub mod media;
pub mod pages;
pub mod robots;
pub mod rsvp;
pub mod startup_checks;
pub mod static_files;
pub mod story;
pub mod templating;
pub mod upload;
pub mod viewer;

use media::{DynMediaStore, MediaError, MediaSource, MediaStoreConfig};
use rsvp::{DynRsvpStore, RsvpError, RsvpStoreConfig};
use story::{ScheduleEvent, StoryConfig};
use upload::SizeLimits;
use viewer::WindowConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    #[serde(default)]
    pub media: MediaStoreConfig,
    #[serde(default)]
    pub database: RsvpStoreConfig,
    #[serde(default = "default_galleries")]
    pub galleries: Vec<GalleryPageConfig>,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub story: StoryConfig,
    /// Events of the day, in order.
    #[serde(default)]
    pub schedule: Vec<ScheduleEvent>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    #[serde(default)]
    pub couple: Option<String>,
    #[serde(default)]
    pub wedding_date: Option<String>,
    /// Ceremony start as RFC 3339; drives the countdown.
    #[serde(default)]
    pub wedding_starts_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Request body ceiling for the upload endpoint. Kept above the per-file
    /// limits so oversized files reach the submitter and fail with a reason.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_body_limit() -> usize {
    256 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Whether a gallery page embeds its list in the HTML or loads it from the
/// media API after the page arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    #[default]
    ServerRendered,
    ClientFetched,
}

/// One instance of the paged media viewer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryPageConfig {
    /// URL segment under `/galleries/`.
    pub name: String,
    pub title: String,
    /// Folder in the media store.
    pub namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub fetch_mode: FetchMode,
    #[serde(default)]
    pub uploads_enabled: bool,
    #[serde(default)]
    pub size_limits: SizeLimits,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Tiles in the first row, which get the higher quality setting.
    #[serde(default = "default_eager_tiles")]
    pub eager_tiles: usize,
    /// Search cap for this gallery; the media provider's default otherwise.
    #[serde(default)]
    pub max_results: Option<usize>,
}

fn default_tile_size() -> u32 {
    600
}

fn default_eager_tiles() -> usize {
    4
}

impl GalleryPageConfig {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            namespace: namespace.into(),
            description: None,
            window: WindowConfig::default(),
            fetch_mode: FetchMode::default(),
            uploads_enabled: false,
            size_limits: SizeLimits::default(),
            tile_size: default_tile_size(),
            eager_tiles: default_eager_tiles(),
            max_results: None,
        }
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    pub fn with_uploads(mut self) -> Self {
        self.uploads_enabled = true;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub fn default_galleries() -> Vec<GalleryPageConfig> {
    vec![
        GalleryPageConfig::new("guest-gallery", "Guest Gallery", "wedding-gallery")
            .with_description("Photos and videos shared by our guests")
            .with_uploads(),
        GalleryPageConfig::new("prenup", "Prenup", "prenup")
            .with_window(WindowConfig::uniform(20).with_delay(Duration::from_millis(300)))
            .with_fetch_mode(FetchMode::ClientFetched),
        GalleryPageConfig::new("proposal", "The Proposal", "proposal")
            .with_window(
                WindowConfig::uniform(20)
                    .with_increment(10)
                    .with_delay(Duration::from_millis(200)),
            )
            .with_max_results(500),
        GalleryPageConfig::new("wedding-day", "Wedding Day", "wedding-day")
            .with_window(
                WindowConfig::uniform(20)
                    .with_increment(10)
                    .with_delay(Duration::from_millis(200)),
            )
            .with_max_results(1000),
        GalleryPageConfig::new("our-story", "Our Story", "our-story"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Our Wedding".to_string(),
                log_level: "info".to_string(),
                couple: None,
                wedding_date: None,
                wedding_starts_at: None,
                base_url: None,
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
            media: MediaStoreConfig::default(),
            database: RsvpStoreConfig::default(),
            galleries: default_galleries(),
            uploads: UploadConfig::default(),
            story: StoryConfig::default(),
            schedule: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Media store error: {0}")]
    Media(#[from] MediaError),

    #[error("RSVP store error: {0}")]
    Rsvp(#[from] RsvpError),
}

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub media: MediaSource,
    pub rsvp_store: DynRsvpStore,
    pub galleries: pages::SharedGalleries,
    pub config: Config,
}

impl AppState {
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let media_store = media::create_store(&config.media)?;
        let rsvp_store = rsvp::create_store(&config.database)?;
        let state = Self::with_stores(config, media_store, rsvp_store);
        state.static_handler.refresh_file_versions().await;
        Ok(state)
    }

    pub fn with_stores(config: Config, media_store: DynMediaStore, rsvp_store: DynRsvpStore) -> Self {
        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
        ));

        let static_handler =
            static_files::StaticFileHandler::new(config.static_files.directory.clone());

        let mut source = MediaSource::new(media_store.clone());
        if let MediaStoreConfig::Cloudinary(cloudinary) = &config.media {
            source = source.with_max_results(cloudinary.max_results);
        }

        let galleries: HashMap<String, pages::GalleryPage> = config
            .galleries
            .iter()
            .map(|gallery| {
                (
                    gallery.name.clone(),
                    pages::GalleryPage::new(gallery.clone(), media_store.clone()),
                )
            })
            .collect();

        Self {
            template_engine,
            static_handler,
            media: source,
            rsvp_store,
            galleries: Arc::new(galleries),
            config,
        }
    }

    /// Stops every gallery's upload timers.
    pub fn teardown(&self) {
        for gallery in self.galleries.values() {
            gallery.teardown();
        }
    }
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let has_version = params.contains_key("v");
    app_state.static_handler.serve(&path, has_version).await
}

pub async fn create_app(config: Config) -> Result<Router, AppError> {
    let app_state = AppState::from_config(config).await?;
    Ok(create_router(app_state))
}

pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.uploads.body_limit_bytes;

    Router::new()
        .route("/", get(templating::template_page_handler))
        .route("/galleries/{name}", get(pages::gallery_page_handler))
        .route(
            "/galleries/{name}/view/{index}",
            get(pages::media_detail_handler),
        )
        .route(
            "/api/galleries/{name}/media",
            get(pages::media_api_handler),
        )
        .route(
            "/api/galleries/{name}/uploads",
            post(pages::upload_handler)
                .get(pages::upload_status_handler)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/rsvp",
            post(rsvp::handlers::submit_rsvp_handler).fallback(rsvp::handlers::method_not_allowed),
        )
        .route(
            "/api/rsvp-list",
            get(rsvp::handlers::list_rsvps_handler).fallback(rsvp::handlers::method_not_allowed),
        )
        .route(
            "/api/rsvp-list/export",
            get(rsvp::handlers::export_rsvps_handler)
                .fallback(rsvp::handlers::method_not_allowed),
        )
        .route("/robots.txt", get(robots::robots_txt_handler))
        .route("/static/{*path}", get(static_file_handler))
        .route("/{*path}", get(templating::template_page_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        query = ?request.uri().query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
