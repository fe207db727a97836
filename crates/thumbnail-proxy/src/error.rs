//! Error types for the thumbnail proxy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

#[derive(Debug)]
pub enum ThumbnailError {
    InvalidRequest(String),
    SizeOutOfRange { width: u32, height: u32 },
    SourceTooSmall {
        requested: (u32, u32),
        actual: (u32, u32),
    },
    OriginUnreachable(String),
    OriginError(u16),
    DownloadFailed(String),
    StorageUnavailable(Box<std::io::Error>),
    DecodeError(String),
    Config(String),
}

impl ThumbnailError {
    /// HTTP status used when the error is returned to a client
    pub fn status_code(&self) -> StatusCode {
        match self {
            ThumbnailError::InvalidRequest(_) | ThumbnailError::SizeOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            ThumbnailError::SourceTooSmall { .. } | ThumbnailError::DecodeError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ThumbnailError::OriginUnreachable(_)
            | ThumbnailError::OriginError(_)
            | ThumbnailError::DownloadFailed(_) => StatusCode::BAD_GATEWAY,
            ThumbnailError::StorageUnavailable(_) | ThumbnailError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ThumbnailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ThumbnailError::SizeOutOfRange { width, height } => {
                write!(f, "Requested size {}x{} is out of range", width, height)
            }
            ThumbnailError::SourceTooSmall { requested, actual } => write!(
                f,
                "Source image {}x{} is smaller than requested {}x{}",
                actual.0, actual.1, requested.0, requested.1
            ),
            ThumbnailError::OriginUnreachable(msg) => write!(f, "Origin unreachable: {}", msg),
            ThumbnailError::OriginError(status) => {
                write!(f, "Origin responded with status {}", status)
            }
            ThumbnailError::DownloadFailed(msg) => write!(f, "Download failed: {}", msg),
            ThumbnailError::StorageUnavailable(err) => write!(f, "Storage unavailable: {}", err),
            ThumbnailError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            ThumbnailError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ThumbnailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ThumbnailError::StorageUnavailable(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ThumbnailError {
    fn from(err: std::io::Error) -> Self {
        ThumbnailError::StorageUnavailable(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ThumbnailError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ThumbnailError::Config(err.to_string())
    }
}

impl IntoResponse for ThumbnailError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;
