use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    ports::{CheckinApi, CodeSource},
    scan::{ScanCommand, ScanEvent, ScanSession, ScanStatus, VerificationOutcome, transition},
};

/// Runs the scan state machine against a backend and a code source.
#[derive(Debug)]
pub struct ScanVerifier<A> {
    api: A,
    session: ScanSession,
}

fn apply(session: &mut ScanSession, event: ScanEvent) -> Option<ScanCommand> {
    let (next, command) = transition(std::mem::take(session), event);
    *session = next;
    command
}

impl<A: CheckinApi> ScanVerifier<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: ScanSession::new(),
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Clears the last result and accepts codes again.
    pub fn reset(&mut self) {
        apply(&mut self.session, ScanEvent::Reset);
    }

    /// Feeds decode passes from `source` until the session settles.
    ///
    /// Returns the settled status, or `None` if the source closed first.
    pub async fn scan_once<S>(&mut self, source: &mut S) -> Option<ScanStatus>
    where
        S: CodeSource + ?Sized,
    {
        while !self.session.status.is_settled() {
            let event = match source.next_batch().await? {
                Ok(candidates) => ScanEvent::Decoded(candidates),
                Err(e) => ScanEvent::DeviceError(e.to_string()),
            };
            if let Some(ScanCommand::Verify { attempt, token }) = apply(&mut self.session, event) {
                self.verify(source, attempt, token).await;
            }
        }
        Some(self.session.status)
    }

    /// Keeps the current result for `delay`, discarding any passes decoded
    /// meanwhile, then resets.
    pub async fn reset_after<S>(&mut self, source: &mut S, delay: Duration)
    where
        S: CodeSource + ?Sized,
    {
        let deadline = tokio::time::sleep(delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                batch = source.next_batch() => match batch {
                    Some(Ok(candidates)) => {
                        apply(&mut self.session, ScanEvent::Decoded(candidates));
                    }
                    Some(Err(e)) => {
                        apply(&mut self.session, ScanEvent::DeviceError(e.to_string()));
                    }
                    None => {
                        (&mut deadline).await;
                        break;
                    }
                },
            }
        }
        self.reset();
    }

    /// Issues one verification while keeping the source running. Passes
    /// decoded in the meantime go through the state machine, which drops them.
    async fn verify<S>(&mut self, source: &mut S, attempt: u64, token: String)
    where
        S: CodeSource + ?Sized,
    {
        let Self { api, session } = self;
        debug!(attempt, "Submitting token for verification");

        let mut request = api.verify(&token);
        let mut source_open = true;

        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                batch = source.next_batch(), if source_open => match batch {
                    Some(Ok(candidates)) => {
                        debug!(count = candidates.len(), "Ignoring decode pass while verifying");
                        apply(session, ScanEvent::Decoded(candidates));
                    }
                    Some(Err(e)) => {
                        apply(session, ScanEvent::DeviceError(e.to_string()));
                        warn!("Device failed during verification: {}", session.last_error);
                        return;
                    }
                    None => source_open = false,
                },
            }
        };

        let outcome = match result {
            Ok(verification) => VerificationOutcome::Confirmed(verification),
            Err(e) => VerificationOutcome::Rejected(e.to_string()),
        };
        apply(session, ScanEvent::Verified { attempt, outcome });

        match session.status {
            ScanStatus::Success => info!(attempt, "Attendee verified"),
            ScanStatus::Error => info!(attempt, error = %session.last_error, "Verification failed"),
            _ => {}
        }
    }
}
