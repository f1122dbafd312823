use super::{GalleryPage, embed_json, tiles};
use crate::media::{ConnectionSpeed, FetchOutcome, SelectedFile, UrlBuilder};
use crate::templating::site_globals;
use crate::upload::{UploadError, UploadOutcome, UploadTask};
use crate::viewer::{BatchWindow, DetachedHost, Lightbox, next_index, prev_index};
use crate::{AppState, FetchMode};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// How many items the client already shows.
    pub visible: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

fn find_gallery<'a>(app_state: &'a AppState, name: &str) -> Option<&'a GalleryPage> {
    let gallery = app_state.galleries.get(name);
    if gallery.is_none() {
        debug!("Gallery '{}' not found", name);
    }
    gallery
}

fn url_builder(app_state: &AppState, headers: &HeaderMap) -> UrlBuilder {
    app_state
        .media
        .store()
        .url_builder()
        .with_speed(ConnectionSpeed::from_headers(headers))
}

#[axum::debug_handler]
pub async fn gallery_page_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(gallery) = find_gallery(&app_state, &name) else {
        return (StatusCode::NOT_FOUND, "Gallery not found").into_response();
    };
    let config = &gallery.config;
    let urls = url_builder(&app_state, &headers);

    let (all_tiles, visible_count, total, fetch_failed) = match config.fetch_mode {
        FetchMode::ServerRendered => {
            let outcome = app_state
                .media
                .fetch_all(&config.namespace, config.max_results)
                .await;
            let fetch_failed = outcome.is_failed();
            let window = BatchWindow::new(outcome.into_items(), config.window);
            (
                tiles(window.all(), 0, &urls, config),
                window.visible_count(),
                window.len(),
                fetch_failed,
            )
        }
        FetchMode::ClientFetched => (Vec::new(), 0, 0, false),
    };

    let visible_tiles = &all_tiles[..visible_count];
    // Client-fetched pages decide this in the browser
    let is_empty =
        config.fetch_mode == FetchMode::ServerRendered && total == 0 && !fetch_failed;
    let size_limits = &config.size_limits;

    let mut globals = site_globals(&app_state, &config.title).await;
    globals.extend(liquid::object!({
        "gallery": {
            "name": config.name,
            "title": config.title,
            "description": config.description,
            "client_fetched": config.fetch_mode == FetchMode::ClientFetched,
            "uploads_enabled": gallery.uploads().is_some(),
            "initial_batch": config.window.initial_batch,
            "increment": config.window.increment,
            "extend_delay_ms": config.window.extend_delay.as_millis() as u64,
            "image_limit": size_limits.describe(crate::media::MediaKind::Image),
            "video_limit": size_limits.describe(crate::media::MediaKind::Video),
            "image_limit_bytes": size_limits.image_bytes,
            "video_limit_bytes": size_limits.video_bytes,
        },
        "tiles": visible_tiles,
        "media_json": embed_json(&all_tiles),
        "visible_count": visible_count,
        "total": total,
        "has_more": visible_count < total,
        "remaining": total - visible_count,
        "is_empty": is_empty,
        "fetch_failed": fetch_failed,
    }));

    app_state
        .template_engine
        .render_html("gallery.html.liquid", globals)
        .await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBatch {
    pub items: Vec<super::MediaTile>,
    pub total: usize,
    pub visible_count: usize,
    pub has_more: bool,
    pub fetch_failed: bool,
}

/// Next batch for a client that already shows `visible` items, or the first
/// window when `visible` is absent.
#[axum::debug_handler]
pub async fn media_api_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<WindowQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(gallery) = find_gallery(&app_state, &name) else {
        return api_error(StatusCode::NOT_FOUND, "Gallery not found");
    };
    let config = &gallery.config;

    let outcome = app_state
        .media
        .fetch_all(&config.namespace, config.max_results)
        .await;
    let items = match outcome {
        FetchOutcome::FetchFailed(reason) => {
            error!("Media list for '{}' unavailable: {}", name, reason);
            return api_error(StatusCode::BAD_GATEWAY, "Failed to load media");
        }
        outcome => outcome.into_items(),
    };

    let urls = url_builder(&app_state, &headers);
    let (window, range) = match query.visible {
        None | Some(0) => {
            let window = BatchWindow::new(items, config.window);
            let range = 0..window.visible_count();
            (window, range)
        }
        Some(visible) => {
            let mut window = BatchWindow::resume(items, config.window, visible);
            window.request_extend();
            let range = window.complete_extend();
            (window, range)
        }
    };

    let start = range.start;
    Json(MediaBatch {
        items: tiles(&window.all()[range], start, &urls, config),
        total: window.len(),
        visible_count: window.visible_count(),
        has_more: window.has_more(),
        fetch_failed: false,
    })
    .into_response()
}

/// Lightbox view of one item in the window the client has open.
#[axum::debug_handler]
pub async fn media_detail_handler(
    State(app_state): State<AppState>,
    Path((name, index)): Path<(String, usize)>,
    Query(query): Query<WindowQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(gallery) = find_gallery(&app_state, &name) else {
        return (StatusCode::NOT_FOUND, "Gallery not found").into_response();
    };
    let config = &gallery.config;

    let outcome = app_state
        .media
        .fetch_all(&config.namespace, config.max_results)
        .await;
    if outcome.is_failed() {
        return (StatusCode::BAD_GATEWAY, "Media is unavailable right now").into_response();
    }
    let window = BatchWindow::resume(
        outcome.into_items(),
        config.window,
        query.visible.unwrap_or(0),
    );
    let len = window.visible_count();

    let mut lightbox = Lightbox::new();
    if !lightbox.open(index, len, &mut DetachedHost) {
        return (StatusCode::NOT_FOUND, "Media not found").into_response();
    }

    let urls = url_builder(&app_state, &headers);
    let item = &window.visible()[index];
    let tile = super::MediaTile::new(index, item, &urls, config);
    let link = |i: usize| format!("/galleries/{}/view/{}?visible={}", config.name, i, len);

    let mut globals = site_globals(&app_state, &config.title).await;
    globals.extend(liquid::object!({
        "gallery": {
            "name": config.name,
            "title": config.title,
        },
        "item": tile,
        "position": index + 1,
        "count": len,
        "prev_url": prev_index(index, len).filter(|_| len > 1).map(link),
        "next_url": next_index(index, len).filter(|_| len > 1).map(link),
        "back_url": format!("/galleries/{}", config.name),
    }));

    app_state
        .template_engine
        .render_html("media_detail.html.liquid", globals)
        .await
}

/// One settled file plus the tile the grid prepends for it.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    #[serde(flatten)]
    pub outcome: UploadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<super::MediaTile>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploads: Vec<UploadResult>,
}

fn upload_error(e: UploadError) -> Response {
    let status = match e {
        UploadError::UploadsDisabled(_) => StatusCode::FORBIDDEN,
        UploadError::MalformedForm(_) | UploadError::NoFiles => StatusCode::BAD_REQUEST,
    };
    api_error(status, e.to_string())
}

async fn read_files(mut multipart: Multipart) -> Result<Vec<SelectedFile>, UploadError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::MalformedForm(e.to_string()))?
    {
        if !matches!(field.name(), Some("file" | "files")) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = match field.content_type() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string(),
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::MalformedForm(e.to_string()))?;
        files.push(SelectedFile::new(file_name, content_type, bytes));
    }

    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }
    Ok(files)
}

/// Runs one selection through the gallery's submitter and reports every
/// file's outcome once all have settled.
#[axum::debug_handler]
pub async fn upload_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let Some(gallery) = find_gallery(&app_state, &name) else {
        return api_error(StatusCode::NOT_FOUND, "Gallery not found");
    };
    let Some(submitter) = gallery.uploads() else {
        warn!("Upload attempted on gallery '{}' without uploads", name);
        return upload_error(UploadError::UploadsDisabled(name));
    };

    let files = match read_files(multipart).await {
        Ok(files) => files,
        Err(e) => return upload_error(e),
    };

    let urls = url_builder(&app_state, &headers);
    let uploads = submitter
        .submit(files, |_| {})
        .wait()
        .await
        .into_iter()
        .map(|outcome| {
            let tile = outcome
                .item
                .as_ref()
                .map(|item| super::MediaTile::new(0, item, &urls, &gallery.config));
            UploadResult { outcome, tile }
        })
        .collect();
    Json(UploadResponse { uploads }).into_response()
}

#[derive(Debug, Serialize)]
pub struct UploadBoard {
    pub tasks: Vec<UploadTask>,
}

#[axum::debug_handler]
pub async fn upload_status_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let Some(gallery) = find_gallery(&app_state, &name) else {
        return api_error(StatusCode::NOT_FOUND, "Gallery not found");
    };
    match gallery.uploads() {
        Some(submitter) => Json(UploadBoard {
            tasks: submitter.board().snapshot(),
        })
        .into_response(),
        None => upload_error(UploadError::UploadsDisabled(name)),
    }
}
