use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Sucesso,
    Erro,
}

/// Error body the evaluation API returns alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: ResponseStatus,
    pub mensagem: String,
}

impl ApiErrorBody {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Erro,
            mensagem: mensagem.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' cannot be used as a request path segment")]
pub struct InvalidPathSegment(pub String);

#[derive(Debug, Error)]
#[error("server rejected request with status {status}: {message}")]
pub struct ApiRejection {
    pub status: u16,
    pub message: String,
}

impl ApiRejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Prefers the server's `mensagem` (or `erro`) when the body carries one.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|parsed| {
                ["mensagem", "erro"]
                    .into_iter()
                    .find_map(|field| parsed.get(field)?.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| body.trim().to_string());
        Self::new(status, message)
    }
}
