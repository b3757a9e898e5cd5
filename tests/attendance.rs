mod common;

use checkin_client::domain::{errors::ApiError, models::DeleteRequest, ports::CheckinApi};
use reqwest::StatusCode;

fn delete_request(name: &str, phone: &str) -> DeleteRequest {
    DeleteRequest {
        name: name.into(),
        phone_number: phone.into(),
    }
}

#[tokio::test]
async fn test_export_returns_spreadsheet_bytes() {
    let (addr, _) = common::spawn_backend().await;

    let spreadsheet = common::client(&addr).export_attendance().await.unwrap();
    assert_eq!(spreadsheet, common::SPREADSHEET);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.xlsx");
    tokio::fs::write(&path, &spreadsheet).await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), common::SPREADSHEET);
}

#[tokio::test]
async fn test_export_failure() {
    let (addr, backend) = common::spawn_backend().await;
    backend.set_export_available(false);

    let error = common::client(&addr).export_attendance().await.unwrap_err();

    assert!(matches!(
        &error,
        ApiError::Backend { status, .. } if *status == StatusCode::SERVICE_UNAVAILABLE
    ));
    assert_eq!(error.to_string(), "Failed to fetch attendance file");
}

#[tokio::test]
async fn test_delete_attendee() {
    let (addr, backend) = common::spawn_backend().await;
    let client = common::client(&addr);

    let message = client
        .delete_attendee(&delete_request("Ada Lovelace", "+234 800 000 0000"))
        .await
        .unwrap();
    assert_eq!(message, "Attendee removed");

    let message = client
        .delete_attendee(&delete_request("Quiet", "0800"))
        .await
        .unwrap();
    assert_eq!(message, "Attendee deleted successfully");

    let calls = backend.delete_calls();
    assert_eq!(calls[0]["name"], "Ada Lovelace");
    assert_eq!(calls[0]["phoneNumber"], "+234 800 000 0000");
}

#[tokio::test]
async fn test_delete_unknown_attendee() {
    let (addr, _) = common::spawn_backend().await;

    let error = common::client(&addr)
        .delete_attendee(&delete_request("Ghost", "0800"))
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Attendee not found");
}

#[tokio::test]
async fn test_delete_requires_name_and_phone() {
    let (addr, backend) = common::spawn_backend().await;

    let error = common::client(&addr)
        .delete_attendee(&delete_request("", ""))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Validation(_)));
    assert_eq!(error.to_string(), "Name and phone number are required");
    assert!(backend.delete_calls().is_empty());
}
