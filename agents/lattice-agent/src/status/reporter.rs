//! Status Reporter
//!
//! Background task that periodically reports host status to the controller,
//! sending only when the content changed since the last successful send.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::agent::registration::RegistrationState;
use crate::connection::protocol::HOST_STATUS_REPORTS_ENDPOINT;
use crate::connection::transport::{Transport, TransportError};
use crate::status::host::SnapshotSource;
use crate::status::report::Report;

/// Outcome classification for one reporting cycle.
///
/// A disconnect during the send is expected whenever the controller drops
/// the connection and is handled silently; everything else is logged and
/// the loop continues.
#[derive(Debug, Error)]
enum CycleError {
    #[error("connection closed during send")]
    Disconnected,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TransportError> for CycleError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionClosed => CycleError::Disconnected,
            TransportError::Other(e) => CycleError::Other(e),
        }
    }
}

/// Periodic, change-only host status reporting task.
///
/// Dependencies (interval, stop signal, snapshot source, transport) are all
/// injected, so the task can be driven deterministically in tests. Owns the
/// last successfully sent report; nothing else reads or writes it.
pub struct StatusReporter {
    interval: Duration,
    stop: watch::Receiver<bool>,
    registration: RegistrationState,
    source: Arc<dyn SnapshotSource>,
    transport: Arc<dyn Transport>,
    last_report: Option<Report>,
}

impl StatusReporter {
    pub fn new(
        interval: Duration,
        stop: watch::Receiver<bool>,
        registration: RegistrationState,
        source: Arc<dyn SnapshotSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            interval,
            stop,
            registration,
            source,
            transport,
            last_report: None,
        }
    }

    /// Run until the stop signal is set. Never terminates on failure: a
    /// disconnect mid-send is swallowed, any other error is logged and the
    /// next cycle starts fresh.
    pub async fn run(mut self) {
        while !*self.stop.borrow() {
            match self.run_cycle().await {
                Ok(()) => {}
                Err(CycleError::Disconnected) => {
                    // Controller went away during the send. The report was
                    // not recorded as sent, so the next cycle retries it.
                }
                Err(CycleError::Other(e)) => {
                    error!(error = %e, "Status report cycle failed, re-running next cycle");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Status reporter finished");
    }

    /// One reporting cycle: snapshot, diff against the last sent report,
    /// send on change. Separated from the wait so it can be unit tested.
    async fn run_cycle(&mut self) -> Result<(), CycleError> {
        if self.registration.is_registered() {
            let mut report = self.source.snapshot()?;

            // Re-check registration after building the snapshot rather than
            // reusing the earlier read, to avoid acting on stale state.
            if self.registration.is_registered()
                && self.last_report.as_ref() != Some(&report)
            {
                report.reported_at = Some(chrono::Utc::now().timestamp_millis());
                self.transport
                    .send(
                        HOST_STATUS_REPORTS_ENDPOINT,
                        serde_json::to_value(&report).map_err(anyhow::Error::from)?,
                    )
                    .await?;
                debug!("Host status report sent");
                self.last_report = Some(report);
            }
        }

        // Not an `else`: registration may flip mid-cycle, and the clear must
        // happen whenever the flag reads false here.
        if !self.registration.is_registered() {
            self.last_report = None;
        }

        Ok(())
    }
}
