use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use validator::Validate;

/// Message the backend attaches when the attendee already exists.
pub const ALREADY_REGISTERED: &str = "This attendee is already registered. QR code retrieved.";

/// A registered attendee as returned by the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_of_attendance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Successful verification of a ticket token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub attendee: Attendee,
    pub message: Option<String>,
}

/// Response envelope shared by every JSON endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub attendee: Option<Attendee>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// The most specific message the backend gave, if any.
    pub fn failure_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "Mode of attendance is required"))]
    pub mode_of_attendance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[validate(length(min = 1, message = "Name and phone number are required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Name and phone number are required"))]
    pub phone_number: String,
}

/// The `data` payload of a successful QR generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// `data:image/png;base64,...` URL of the signed QR code.
    pub qr_code: String,
    #[serde(default)]
    pub attendee_details: Map<String, Value>,
    pub verification_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum QrImageError {
    #[error("QR code is not a base64 data URL")]
    NotDataUrl,
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

impl Registration {
    pub fn already_registered(&self) -> bool {
        self.message.as_deref() == Some(ALREADY_REGISTERED)
    }

    /// Decodes the image bytes embedded in `qr_code`.
    pub fn qr_image(&self) -> Result<Vec<u8>, QrImageError> {
        let (header, payload) = self
            .qr_code
            .split_once(',')
            .ok_or(QrImageError::NotDataUrl)?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return Err(QrImageError::NotDataUrl);
        }
        Ok(STANDARD.decode(payload.trim())?)
    }

    /// File name used when saving the QR image, e.g. `qr-code-Ada-Lovelace.png`.
    pub fn qr_file_name(&self) -> String {
        let name = self
            .attendee_details
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("attendee");
        let slug = name.split_whitespace().collect::<Vec<_>>().join("-");
        format!("qr-code-{slug}.png")
    }

    /// Non-empty attendee details as printable `(Label, value)` pairs.
    pub fn details(&self) -> Vec<(String, String)> {
        self.attendee_details
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Null | Value::Bool(false) => return None,
                    Value::String(s) if s.is_empty() => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((capitalize(key), value))
            })
            .collect()
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
