use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Guesses the kind from a MIME type. Anything that isn't `video/*` is
    /// treated as an image, the same way the upload picker does.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.to_ascii_lowercase().starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub kind: MediaKind,
    pub display_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, kind: MediaKind, display_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            display_url: display_url.into(),
            dimensions: None,
            uploader: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Result of asking a media source for one namespace.
///
/// `Empty` and `FetchFailed` used to look the same to visitors; keeping them
/// apart lets a page offer a retry instead of an empty grid.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Vec<MediaItem>),
    Empty,
    FetchFailed(String),
}

impl FetchOutcome {
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        if items.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Loaded(items)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::FetchFailed(_))
    }

    /// Items for rendering; a failed fetch renders as zero items.
    pub fn into_items(self) -> Vec<MediaItem> {
        match self {
            FetchOutcome::Loaded(items) => items,
            FetchOutcome::Empty | FetchOutcome::FetchFailed(_) => Vec::new(),
        }
    }
}

/// A file picked by a guest, as handed to the upload submitter.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: bytes::Bytes,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<bytes::Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_content_type(&self.content_type)
    }
}
