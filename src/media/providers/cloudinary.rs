use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::media::{
    CloudinaryConfig, MediaError, MediaItem, MediaKind, MediaStore, ProgressReporter,
    SelectedFile, TransformOptions, UrlBuilder,
};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Largest page the search API returns; bigger caps are fetched page by page.
const SEARCH_PAGE_SIZE: usize = 500;

pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    public_id: String,
    #[serde(default)]
    resource_type: Option<String>,
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Search expression scoping a query to one folder and everything below it.
pub fn folder_expression(namespace: &str) -> String {
    format!("folder:{}/*", namespace.trim_matches('/'))
}

impl CloudinaryStore {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, MediaError> {
        if config.cloud_name.trim().is_empty() {
            return Err(MediaError::ConfigError("cloud_name is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("wedding-site/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    fn to_item(&self, resource: Resource) -> MediaItem {
        let kind = match resource.resource_type.as_deref() {
            Some("video") => MediaKind::Video,
            _ => MediaKind::Image,
        };
        let display_url = resource.secure_url.unwrap_or_else(|| {
            self.url_builder()
                .build(&resource.public_id, kind, &TransformOptions::default())
        });

        let mut item = MediaItem::new(resource.public_id, kind, display_url);
        if let (Some(width), Some(height)) = (resource.width, resource.height) {
            item = item.with_dimensions(width, height);
        }
        item
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MediaError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

fn search_body(expression: &str, max_results: usize, cursor: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "expression": expression,
        "sort_by": [{ "created_at": "desc" }],
        "max_results": max_results,
    });
    if let Some(cursor) = cursor {
        body["next_cursor"] = json!(cursor);
    }
    body
}

fn chunk_body(bytes: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut start = 0;
    while start < bytes.len() {
        let end = (start + UPLOAD_CHUNK_SIZE).min(bytes.len());
        chunks.push(bytes.slice(start..end));
        start = end;
    }
    chunks
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn search(
        &self,
        namespace: &str,
        max_results: usize,
    ) -> Result<Vec<MediaItem>, MediaError> {
        let expression = folder_expression(namespace);
        debug!("Searching media store: {} (up to {})", expression, max_results);

        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        while items.len() < max_results {
            let page_size = (max_results - items.len()).min(SEARCH_PAGE_SIZE);
            let body = search_body(&expression, page_size, cursor.as_deref());

            let response = self
                .client
                .post(self.endpoint("resources/search"))
                .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
                .json(&body)
                .send()
                .await?;
            let response = check_status(response).await?;

            let data: SearchResponse = response
                .json()
                .await
                .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

            debug!(
                "Media store returned {} resources for {}",
                data.resources.len(),
                namespace
            );

            let returned = data.resources.len();
            items.extend(data.resources.into_iter().map(|r| self.to_item(r)));

            match data.next_cursor {
                Some(next) if returned > 0 => cursor = Some(next),
                _ => break,
            }
        }

        items.truncate(max_results);
        Ok(items)
    }

    async fn upload(
        &self,
        file: &SelectedFile,
        namespace: &str,
        progress: ProgressReporter,
    ) -> Result<MediaItem, MediaError> {
        let kind = file.kind();
        let total = file.size();

        let mut sent = 0u64;
        let body = futures::stream::iter(chunk_body(&file.bytes)).map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body),
            total,
        )
        .file_name(file.name.clone())
        .mime_str(&file.content_type)?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("folder", namespace.to_string());

        let endpoint = self.endpoint(&format!("{}/upload", kind.as_str()));
        debug!("Uploading {} ({} bytes) to {}", file.name, total, endpoint);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload request for {} failed: {}", file.name, e);
                MediaError::HttpError(e)
            })?;
        let response = check_status(response).await?;

        let data: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        let mut item = MediaItem::new(data.public_id, kind, data.secure_url);
        if let (Some(width), Some(height)) = (data.width, data.height) {
            item = item.with_dimensions(width, height);
        }
        Ok(item)
    }

    fn reports_progress(&self) -> bool {
        true
    }

    fn url_builder(&self) -> UrlBuilder {
        let builder = UrlBuilder::new(self.config.cloud_name.clone());
        match &self.config.delivery_base {
            Some(base) => builder.with_delivery_base(base.clone()),
            None => builder,
        }
    }

    fn name(&self) -> &str {
        "Cloudinary"
    }
}
