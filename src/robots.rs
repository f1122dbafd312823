use crate::AppState;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Keeps crawlers out of the RSVP admin page and the JSON endpoints.
pub const DEFAULT_ROBOTS: &str = "User-agent: *
Disallow: /rsvp-admin
Disallow: /api/
Allow: /
";

/// Handler for /robots.txt. A `robots.txt` in the static directory wins over
/// the built-in rules.
pub async fn robots_txt_handler(State(app_state): State<AppState>) -> Response {
    let custom_robots_path = app_state.config.static_files.directory.join("robots.txt");

    let body = match tokio::fs::read_to_string(&custom_robots_path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!("Failed to read custom robots.txt: {}", e);
            }
            DEFAULT_ROBOTS.to_string()
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
