use reqwest::StatusCode;
use thiserror::Error;
use validator::ValidationErrors;

pub const CONNECT_FAILED: &str = "Could not connect to server";

/// Errors returned by the check-in backend client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request was rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Could not connect to server")]
    Connect(#[source] reqwest::Error),
    /// The backend answered but reported a failure.
    #[error("{message}")]
    Backend { status: StatusCode, message: String },
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Convenience function to create a backend error with a fallback message
    pub fn backend(status: StatusCode, message: Option<&str>, fallback: &str) -> Self {
        let message = message.unwrap_or(fallback).to_string();
        tracing::warn!(%status, "Backend reported failure: {message}");
        ApiError::Backend { status, message }
    }

    pub fn connect(error: reqwest::Error) -> Self {
        tracing::error!("Request failed: {error:?}");
        ApiError::Connect(error)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = Vec::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (field, field_errors) in fields {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                if !messages.contains(&message) {
                    messages.push(message);
                }
            }
        }
        ApiError::Validation(messages.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
