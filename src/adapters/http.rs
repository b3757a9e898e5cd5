use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url, header};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, info};
use validator::Validate;

use crate::domain::{
    errors::ApiError,
    models::{DeleteRequest, Envelope, RegisterRequest, Registration, Verification},
    ports::CheckinApi,
    scan::INVALID_CODE,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const REGISTER_FAILED: &str = "Failed to generate QR code";
const EXPORT_FAILED: &str = "Failed to fetch attendance file";
const DELETE_FAILED: &str = "Failed to delete attendee";
const DELETE_DONE: &str = "Attendee deleted successfully";

/// [`CheckinApi`] over the backend's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a client for the backend at `base_url`.
    ///
    /// The base URL may carry a path prefix; endpoints are resolved below it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) origin".into()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("checkin-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::connect)?;

        Ok(Self {
            http_client,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Reads the status and, when the body is JSON, the response envelope.
async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<(StatusCode, Option<Envelope<T>>), ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(ApiError::connect)?;
    let envelope = match serde_json::from_slice(&body) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            debug!(%status, "Response body is not a JSON envelope: {e}");
            None
        }
    };
    Ok((status, envelope))
}

fn failure<T>(status: StatusCode, envelope: Option<&Envelope<T>>, fallback: &str) -> ApiError {
    ApiError::backend(status, envelope.and_then(Envelope::failure_message), fallback)
}

#[async_trait]
impl CheckinApi for HttpBackend {
    async fn verify(&self, token: &str) -> Result<Verification, ApiError> {
        let url = self.endpoint("api/verify")?;
        debug!(%url, "Verifying ticket token");

        let response = self
            .http_client
            .get(url)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(ApiError::connect)?;

        match read_envelope::<IgnoredAny>(response).await? {
            (
                status,
                Some(Envelope {
                    success: true,
                    attendee: Some(attendee),
                    message,
                    ..
                }),
            ) if status.is_success() => {
                info!(name = %attendee.name, "Ticket verified");
                Ok(Verification { attendee, message })
            }
            (status, envelope) => Err(failure(status, envelope.as_ref(), INVALID_CODE)),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Registration, ApiError> {
        request.validate()?;
        let url = self.endpoint("api/generate-qr")?;
        debug!(%url, name = %request.name, "Requesting QR code");

        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::connect)?;

        match read_envelope::<Registration>(response).await? {
            (
                status,
                Some(Envelope {
                    success: true,
                    data: Some(registration),
                    ..
                }),
            ) if status.is_success() => {
                info!(
                    already_registered = registration.already_registered(),
                    "QR code issued"
                );
                Ok(registration)
            }
            (status, envelope) => Err(failure(status, envelope.as_ref(), REGISTER_FAILED)),
        }
    }

    async fn export_attendance(&self) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint("api/export-attendance")?;
        debug!(%url, "Exporting attendance");

        let response = self
            .http_client
            .get(url)
            .header(header::ACCEPT, XLSX_MIME)
            .send()
            .await
            .map_err(ApiError::connect)?;

        if !response.status().is_success() {
            let (status, envelope) = read_envelope::<IgnoredAny>(response).await?;
            return Err(failure(status, envelope.as_ref(), EXPORT_FAILED));
        }

        let bytes = response.bytes().await.map_err(ApiError::connect)?;
        info!(size = bytes.len(), "Attendance exported");
        Ok(bytes.to_vec())
    }

    async fn delete_attendee(&self, request: &DeleteRequest) -> Result<String, ApiError> {
        request.validate()?;
        let url = self.endpoint("api/delete-attendee")?;
        debug!(%url, name = %request.name, "Deleting attendee");

        let response = self
            .http_client
            .delete(url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::connect)?;

        match read_envelope::<IgnoredAny>(response).await? {
            (
                status,
                Some(Envelope {
                    success: true,
                    message,
                    ..
                }),
            ) if status.is_success() => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DELETE_DONE.to_string());
                info!("{message}");
                Ok(message)
            }
            (status, envelope) => Err(failure(status, envelope.as_ref(), DELETE_FAILED)),
        }
    }
}
