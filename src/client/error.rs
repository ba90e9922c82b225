use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A failure reported by the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with its structured error body.
    #[error("{code} Error: {message} ({description})")]
    Structured {
        status: StatusCode,
        code: String,
        message: String,
        description: String,
    },

    /// Anything else that came back with a non-success status.
    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    description: Option<String>,
}

impl ApiError {
    /// Build an error from a non-success response body.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        if let Ok(ErrorBody {
            code,
            message: Some(message),
            description,
        }) = serde_json::from_str::<ErrorBody>(body)
        {
            let code = match code {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => status.as_u16().to_string(),
            };
            return Self::Structured {
                status,
                code,
                message,
                description: description.unwrap_or_default(),
            };
        }

        let body = if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        };
        Self::Status { status, body }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Structured { status, .. } | Self::Status { status, .. } => *status,
        }
    }
}
