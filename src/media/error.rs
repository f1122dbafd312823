use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media store configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Media store returned status {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Unexpected media store response: {0}")]
    InvalidResponse(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}
