use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::UNIX_EPOCH};
use tokio::{fs::File, sync::RwLock};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

/// Serves `/static/*` and hands templates cache-busting URLs for the site's
/// stylesheet and viewer script.
#[derive(Clone)]
pub struct StaticFileHandler {
    pub static_dir: PathBuf,
    file_versions: Arc<RwLock<HashMap<String, u64>>>,
}

impl StaticFileHandler {
    pub fn new(static_dir: PathBuf) -> Self {
        Self {
            static_dir,
            file_versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn refresh_file_versions(&self) {
        info!("Refreshing static file versions");
        let mut versions = self.file_versions.write().await;
        versions.clear();

        let Ok(mut entries) = tokio::fs::read_dir(&self.static_dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if let Ok(metadata) = entry.metadata().await
                && metadata.is_file()
                && let Some(ext) = path.extension()
                && (ext == "css" || ext == "js")
                && let Ok(modified) = metadata.modified()
                && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
                && let Some(file_name) = path.file_name().and_then(|n| n.to_str())
            {
                versions.insert(file_name.to_string(), duration.as_secs());
                debug!("File version: {} -> {}", file_name, duration.as_secs());
            }
        }
    }

    pub async fn versioned_url(&self, path: &str) -> String {
        let filename = path.rsplit('/').next().unwrap_or(path);
        match self.file_versions.read().await.get(filename) {
            Some(version) => format!("{}?v={}", path, version),
            None => path.to_string(),
        }
    }

    pub async fn serve(&self, path: &str, has_version: bool) -> Response {
        if path.split('/').any(|segment| segment == "..") {
            error!("Path traversal attempt: {}", path);
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }

        let file_path = self.static_dir.join(path.trim_start_matches('/'));
        debug!("Attempting to serve static file: {:?}", file_path);

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) if m.is_file() => m,
            _ => return (StatusCode::NOT_FOUND, "File not found").into_response(),
        };

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open file {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let cache_control = if has_version {
            "public, max-age=31536000, immutable"
        } else if content_type.starts_with("image/") {
            "public, max-age=86400"
        } else {
            "public, max-age=300, must-revalidate"
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control);

        if let Ok(modified) = metadata.modified()
            && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
        {
            response = response.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
            let etag = format!("\"{}-{}\"", duration.as_secs(), metadata.len());
            response = response.header(header::ETAG, etag);
        }

        let body = Body::from_stream(ReaderStream::new(file));
        response.body(body).unwrap_or_else(|e| {
            error!("Failed to build static response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_serves_with_headers() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("style.css"), "body {}")
            .await
            .unwrap();
        let handler = StaticFileHandler::new(dir.path().to_path_buf());

        let response = handler.serve("style.css", false).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert!(response.headers().contains_key(header::ETAG));
        assert!(response.headers().contains_key(header::LAST_MODIFIED));

        let response = handler.serve("style.css", true).await;
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_and_traversal() {
        let dir = TempDir::new().unwrap();
        let handler = StaticFileHandler::new(dir.path().to_path_buf());
        assert_eq!(
            handler.serve("nope.js", false).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            handler.serve("../secret", false).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_versioned_url() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("gallery.js"), "")
            .await
            .unwrap();
        let handler = StaticFileHandler::new(dir.path().to_path_buf());
        assert_eq!(handler.versioned_url("/static/gallery.js").await, "/static/gallery.js");

        handler.refresh_file_versions().await;
        assert!(
            handler
                .versioned_url("/static/gallery.js")
                .await
                .starts_with("/static/gallery.js?v=")
        );
    }
}
