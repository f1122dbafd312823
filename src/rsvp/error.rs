use thiserror::Error;

#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Database configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid database URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Database returned status {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Unexpected database response: {0}")]
    InvalidResponse(String),

    #[error("Failed to save RSVP: {0}")]
    RsvpInsertFailed(String),

    #[error("Failed to save guest information: {0}")]
    GuestInsertFailed(String),

    #[error("Failed to fetch RSVP records: {0}")]
    RsvpFetchFailed(String),

    #[error("Failed to fetch guest records: {0}")]
    GuestFetchFailed(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Could not load RSVPs: {0}")]
    Store(#[from] RsvpError),
}
