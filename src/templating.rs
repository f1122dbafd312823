use crate::AppState;
use crate::story::{Countdown, timeline_cards};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

pub const HEADER_TEMPLATE: &str = "_header.html.liquid";
pub const FOOTER_TEMPLATE: &str = "_footer.html.liquid";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Failed to parse template {0}: {1}")]
    Parse(String, String),

    #[error("Failed to render template {0}: {1}")]
    Render(String, String),
}

impl TemplateError {
    pub fn status(&self) -> StatusCode {
        match self {
            TemplateError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, name: &str) -> Result<String, TemplateError> {
        let template_path = self.template_dir.join(name);

        let metadata = match tokio::fs::metadata(&template_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(TemplateError::NotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(name.to_string()));
            }
            Err(e) => return Err(TemplateError::Io(name.to_string(), e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| TemplateError::Io(name.to_string(), e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(name)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", name);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", name);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| TemplateError::Io(name.to_string(), e))?;

        cache.insert(
            name.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    async fn render_one(&self, name: &str, globals: &liquid::Object) -> Result<String, TemplateError> {
        let source = self.load_template(name).await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| TemplateError::Parse(name.to_string(), e.to_string()))?;

        let template = parser
            .parse(&source)
            .map_err(|e| TemplateError::Parse(name.to_string(), e.to_string()))?;

        template
            .render(globals)
            .map_err(|e| TemplateError::Render(name.to_string(), e.to_string()))
    }

    /// Header and footer are optional; a broken one is logged and left out.
    async fn render_partial(&self, name: &str, globals: &liquid::Object) -> String {
        self.render_one(name, globals).await.unwrap_or_else(|e| {
            error!("Failed to render {}: {}", name, e);
            String::new()
        })
    }

    /// Renders `template_name` with the shared header and footer available as
    /// `header` and `footer`.
    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, TemplateError> {
        let header = self.render_partial(HEADER_TEMPLATE, &globals).await;
        let footer = self.render_partial(FOOTER_TEMPLATE, &globals).await;

        let mut full_globals = globals;
        full_globals.insert(
            "header".into(),
            liquid::model::Value::Scalar(header.into()),
        );
        full_globals.insert(
            "footer".into(),
            liquid::model::Value::Scalar(footer.into()),
        );

        self.render_one(template_name, &full_globals).await
    }

    pub async fn render_html(&self, template_name: &str, globals: liquid::Object) -> Response {
        match self.render_template(template_name, globals).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Template rendering error: {}", e);
                (e.status(), "Page not available").into_response()
            }
        }
    }
}

/// Maps a request path to a page template. Partials (leading `_`) and
/// anything that tries to leave the template directory are not pages.
pub fn page_template_name(path: &str) -> Option<String> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Some("index.html.liquid".to_string());
    }
    let hidden = path
        .split('/')
        .any(|segment| segment.is_empty() || segment.starts_with('_') || segment.starts_with('.'));
    if hidden || path.contains('\\') {
        return None;
    }
    Some(format!("{}.html.liquid", path))
}

#[derive(Debug, Serialize)]
struct GalleryLink {
    name: String,
    title: String,
    description: Option<String>,
    url: String,
}

/// Values every page template can use.
pub async fn site_globals(app_state: &AppState, page_title: &str) -> liquid::Object {
    let galleries: Vec<GalleryLink> = app_state
        .config
        .galleries
        .iter()
        .map(|g| GalleryLink {
            name: g.name.clone(),
            title: g.title.clone(),
            description: g.description.clone(),
            url: format!("/galleries/{}", g.name),
        })
        .collect();

    let style_url = app_state
        .static_handler
        .versioned_url("/static/style.css")
        .await;
    let script_url = app_state
        .static_handler
        .versioned_url("/static/gallery.js")
        .await;
    let story_script_url = app_state
        .static_handler
        .versioned_url("/static/story.js")
        .await;

    let config = &app_state.config;
    let app = &config.app;
    let countdown_units = app
        .wedding_starts_at
        .and_then(|target| Countdown::until(target, Utc::now()))
        .map(|countdown| countdown.units())
        .unwrap_or_default();

    liquid::object!({
        "app_name": app.name,
        "couple": app.couple,
        "wedding_date": app.wedding_date,
        "base_url": app.base_url,
        "page_title": page_title,
        "galleries": galleries,
        "style_url": style_url,
        "script_url": script_url,
        "story_script_url": story_script_url,
        "profiles": config.story.profiles,
        "timeline": timeline_cards(&config.story.timeline),
        "schedule": config.schedule,
        "countdown": {
            "target": app.wedding_starts_at.map(|t| t.to_rfc3339()),
            "units": countdown_units,
        },
        "current_year": Utc::now().year(),
    })
}

#[axum::debug_handler]
pub async fn template_page_handler(
    State(app_state): State<AppState>,
    path: Option<Path<String>>,
) -> Response {
    let path = path.map(|p| p.0).unwrap_or_default();

    let Some(template_name) = page_template_name(&path) else {
        debug!("Refusing to render '{}' as a page", path);
        return (StatusCode::NOT_FOUND, "Page not found").into_response();
    };

    let title = path
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.replace('-', " "))
        .unwrap_or_else(|| app_state.config.app.name.clone());

    let globals = site_globals(&app_state, &title).await;
    app_state
        .template_engine
        .render_html(&template_name, globals)
        .await
}
