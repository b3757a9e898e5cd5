use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::time::{Interval, MissedTickBehavior};

use crate::domain::{errors::DeviceError, ports::CodeSource};

/// Separates simultaneous candidates within one decode pass.
pub const CANDIDATE_SEPARATOR: char = '\t';

/// A [`CodeSource`] fed by an external decoder writing one line per decode
/// pass, e.g. `zbarcam --raw | checkin scan`.
///
/// A line may hold several tab-separated candidates; an empty line is a pass
/// that found nothing. Passes are handed out no faster than `scan_delay`.
#[derive(Debug)]
pub struct LineSource<R> {
    lines: Lines<R>,
    ticker: Option<Interval>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, scan_delay: Duration) -> Self {
        let ticker = (!scan_delay.is_zero()).then(|| {
            let mut ticker = tokio::time::interval(scan_delay);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        Self {
            lines: reader.lines(),
            ticker,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CodeSource for LineSource<R> {
    async fn next_batch(&mut self) -> Option<Result<Vec<String>, DeviceError>> {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }

        match self.lines.next_line().await {
            Ok(Some(line)) => Some(Ok(line
                .trim_end_matches('\r')
                .split(CANDIDATE_SEPARATOR)
                .filter(|candidate| !candidate.is_empty())
                .map(str::to_string)
                .collect())),
            Ok(None) => {
                tracing::debug!("Decoder input closed");
                None
            }
            Err(e) => Some(Err(DeviceError::Io(e))),
        }
    }
}
