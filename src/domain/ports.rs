//! Interfaces the check-in workflow uses to reach the outside world.

use async_trait::async_trait;

use crate::domain::errors::{ApiError, DeviceError};
use crate::domain::models::{DeleteRequest, RegisterRequest, Registration, Verification};

/// The check-in backend.
#[async_trait]
pub trait CheckinApi: Send + Sync {
    /// Looks up the attendee a ticket token belongs to.
    async fn verify(&self, token: &str) -> Result<Verification, ApiError>;

    /// Registers an attendee and returns the signed QR code.
    async fn register(&self, request: &RegisterRequest) -> Result<Registration, ApiError>;

    /// Downloads the attendance spreadsheet.
    async fn export_attendance(&self) -> Result<Vec<u8>, ApiError>;

    /// Deletes an attendee, returning the backend's confirmation message.
    async fn delete_attendee(&self, request: &DeleteRequest) -> Result<String, ApiError>;
}

/// A camera and decoder pair.
///
/// Each call waits for the next decode pass, which may yield zero or more
/// candidate payloads. Implementations enforce their own minimum delay
/// between passes. `None` means the device has been closed.
#[async_trait]
pub trait CodeSource: Send {
    async fn next_batch(&mut self) -> Option<Result<Vec<String>, DeviceError>>;
}
