use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Uploads are not enabled for gallery '{0}'")]
    UploadsDisabled(String),

    #[error("Malformed upload form: {0}")]
    MalformedForm(String),

    #[error("No files in upload")]
    NoFiles,
}
