use shared::error::{ApiRejection, InvalidPathSegment};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("request to {path} was rejected: {source}")]
    Status {
        path: String,
        #[source]
        source: ApiRejection,
    },
    #[error("malformed response body from {path}: {reason}")]
    MalformedBody { path: String, reason: String },
    #[error(transparent)]
    InvalidPathSegment(#[from] InvalidPathSegment),
}

impl ClientError {
    pub fn transport(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn status(path: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Status {
            path: path.into(),
            source: ApiRejection::from_body(status, body),
        }
    }

    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedBody {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status of a rejected request, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { source, .. } => Some(source.status),
            _ => None,
        }
    }
}
