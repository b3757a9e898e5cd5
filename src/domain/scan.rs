//! Scan verification state machine.
//!
//! The machine is a pure function of the current [`ScanSession`] and an
//! incoming [`ScanEvent`]. It never performs I/O itself: accepting a decoded
//! code yields a [`ScanCommand::Verify`] that the driver executes, feeding the
//! result back as [`ScanEvent::Verified`].

use std::fmt;

use crate::domain::{
    models::{Attendee, Verification},
    token::extract_token,
};

/// Shown when the backend rejects a token without saying why.
pub const INVALID_CODE: &str = "Invalid QR code";
/// Prefix for camera and decoder failures.
pub const DEVICE_ERROR_PREFIX: &str = "Error accessing camera";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    /// Camera active, accepting decode events.
    #[default]
    Ready,
    /// A verification request is in flight.
    Verifying,
    Success,
    Error,
}

impl ScanStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, ScanStatus::Success | ScanStatus::Error)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            ScanStatus::Ready => "ready",
            ScanStatus::Verifying => "verifying",
            ScanStatus::Success => "success",
            ScanStatus::Error => "error",
        };
        f.write_str(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanSession {
    pub status: ScanStatus,
    /// Empty unless `status` is `Error`.
    pub last_error: String,
    pub attendee: Option<Attendee>,
    pub message: Option<String>,
    /// Number of decode events accepted so far. Tags each verification so
    /// that a response for an earlier attempt can be recognised as stale.
    pub attempt: u64,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of a verification call, as seen by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Confirmed(Verification),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// One decode pass; may carry zero or more candidates.
    Decoded(Vec<String>),
    /// A verification call issued under `attempt` has settled.
    Verified {
        attempt: u64,
        outcome: VerificationOutcome,
    },
    /// The camera or decoder failed.
    DeviceError(String),
    /// Explicit user reset.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    Verify { attempt: u64, token: String },
}

/// Applies `event` to `session`.
///
/// Returns the next session and, when a decode event was accepted, the
/// verification the caller must issue.
pub fn transition(session: ScanSession, event: ScanEvent) -> (ScanSession, Option<ScanCommand>) {
    match (session.status, event) {
        (ScanStatus::Ready, ScanEvent::Decoded(candidates)) => {
            let Some(decoded) = candidates.into_iter().find(|c| !c.is_empty()) else {
                return (session, None);
            };
            let token = extract_token(&decoded);
            if token.is_empty() {
                return (session, None);
            }

            let attempt = session.attempt + 1;
            let next = ScanSession {
                status: ScanStatus::Verifying,
                last_error: String::new(),
                attendee: None,
                message: None,
                attempt,
            };
            (next, Some(ScanCommand::Verify { attempt, token }))
        }
        (_, ScanEvent::Decoded(_)) => (session, None),

        (ScanStatus::Verifying, ScanEvent::Verified { attempt, outcome })
            if attempt == session.attempt =>
        {
            let next = match outcome {
                VerificationOutcome::Confirmed(verification) => ScanSession {
                    status: ScanStatus::Success,
                    last_error: String::new(),
                    attendee: Some(verification.attendee),
                    message: verification.message,
                    ..session
                },
                VerificationOutcome::Rejected(message) => ScanSession {
                    status: ScanStatus::Error,
                    last_error: if message.is_empty() {
                        INVALID_CODE.to_string()
                    } else {
                        message
                    },
                    attendee: None,
                    message: None,
                    ..session
                },
            };
            (next, None)
        }
        (status, ScanEvent::Verified { attempt, .. }) => {
            tracing::debug!(
                attempt,
                current = session.attempt,
                %status,
                "Dropping stale verification response"
            );
            (session, None)
        }

        (ScanStatus::Ready | ScanStatus::Verifying, ScanEvent::DeviceError(detail)) => {
            let next = ScanSession {
                status: ScanStatus::Error,
                last_error: format!("{DEVICE_ERROR_PREFIX}: {detail}"),
                attendee: None,
                message: None,
                ..session
            };
            (next, None)
        }
        (_, ScanEvent::DeviceError(_)) => (session, None),

        // A reset while verifying abandons the request; its response will
        // be dropped by the attempt check above.
        (_, ScanEvent::Reset) => {
            let next = ScanSession {
                attempt: session.attempt,
                ..ScanSession::default()
            };
            (next, None)
        }
    }
}
