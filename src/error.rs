use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Message(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::Message(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Message(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Message(value.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(value: toml::de::Error) -> Self {
        AppError::Config(value.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Message(value.to_string())
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Internal server error",
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Faults raised by a [`crate::store::CatalogStore`] backing.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database error: invalid record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Unavailable(String),
}

/// Why a tool invocation was refused before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments {
        tool: String,
        parameters: Vec<String>,
        reason: String,
    },
    #[error("Tool function '{0}' not implemented")]
    NotImplemented(String),
}

impl ToolError {
    pub fn parameters(&self) -> &[String] {
        match self {
            ToolError::InvalidArguments { parameters, .. } => parameters,
            _ => &[],
        }
    }
}

/// Terminal failures of a single user turn. None of these mutate session history.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("AI processing failed: {0}")]
    ModelBackend(String),
    #[error("AI processing failed: turn cancelled")]
    Cancelled,
    #[error("AI processing failed: session store error: {0}")]
    Session(String),
}

impl AgentError {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::ModelBackend(_) => "model_backend",
            AgentError::Cancelled => "cancelled",
            AgentError::Session(_) => "session",
        }
    }
}

impl From<AgentError> for AppError {
    fn from(value: AgentError) -> Self {
        AppError::Message(value.to_string())
    }
}
