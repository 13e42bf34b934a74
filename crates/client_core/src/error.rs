use shared::error::ErrorCode;
use thiserror::Error;

/// Failures surfaced by the API client and the controllers.
///
/// `Display` of [`ClientError::Api`] is the backend's message verbatim, so it
/// can be handed straight to an alert.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("nothing stored under '{0}'")]
    MissingLocal(String),
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("audio upload was abandoned before a file was saved")]
    UploadAbandoned,
    #[error("{0}")]
    Invalid(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self.status() {
            Some(status) => ErrorCode::from_status(status),
            None => ErrorCode::Internal,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
