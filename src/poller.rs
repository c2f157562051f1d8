//! Drives the device conversation.
//!
//! One rotation is: status request (decoded and published), then each auxiliary
//! command in turn. Every request waits for the device to settle, writes the
//! command, waits for the device to answer, and then drains whatever arrived.
//!
//! Decode problems are logged and skipped, keeping the previous snapshot.
//! Link problems end the poller, and are meant to end the process.

use std::{convert::Infallible, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    device::{Command, DeviceLink, Response},
    error::Error,
    snapshot::SnapshotWriter,
    status::{self, MalformedFrame},
};

/// How long to let the device settle before each command.
pub const SETTLE: Duration = Duration::from_millis(700);

/// How long the device needs to answer a command.
pub const RESPONSE_LATENCY: Duration = Duration::from_millis(150);

/// The waits around each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait before writing a command.
    pub settle: Duration,

    /// Wait between writing a command and draining the response.
    pub response_latency: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: SETTLE,
            response_latency: RESPONSE_LATENCY,
        }
    }
}

/// What became of a status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new status was published.
    Published,

    /// The response did not decode. The previous snapshot stays.
    Rejected(MalformedFrame),

    /// The device did not answer. The previous snapshot stays.
    NoData,
}

/// Owns a [`DeviceLink`] and the [`SnapshotWriter`].
#[derive(Debug)]
pub struct Poller<L> {
    link: L,
    writer: SnapshotWriter,
    timing: Timing,
}

impl<L: DeviceLink> Poller<L> {
    /// Create a poller. Nothing happens until it is run.
    pub fn new(link: L, writer: SnapshotWriter, timing: Timing) -> Self {
        Self {
            link,
            writer,
            timing,
        }
    }

    /// Perform a single request: settle, write, wait, drain.
    pub async fn request(&mut self, command: Command) -> Result<Response, Error> {
        tokio::time::sleep(self.timing.settle).await;

        self.link
            .write(&command.to_wire())
            .await
            .map_err(|e| Error::device_io(self.link.name(), e))?;

        tokio::time::sleep(self.timing.response_latency).await;

        let bytes = self
            .link
            .read_available()
            .await
            .map_err(|e| Error::device_io(self.link.name(), e))?;

        Ok(Response::from(bytes))
    }

    fn publish(&self, response: &Response) -> Outcome {
        let Response::Data(frame) = response else {
            warn!("Device did not answer the status request");
            return Outcome::NoData;
        };

        match status::decode(frame) {
            Ok(status) => {
                debug!(?status, "Publishing status");
                self.writer.set(status);
                Outcome::Published
            }
            Err(e) => {
                warn!(%e, %response, "Rejected status frame, keeping previous snapshot");
                Outcome::Rejected(e)
            }
        }
    }

    /// Do one full rotation of commands.
    /// Only link problems are returned as errors.
    pub async fn poll_once(&mut self) -> Result<Outcome, Error> {
        let response = self.request(Command::StatusRequest).await?;
        let outcome = self.publish(&response);

        for command in Command::AUXILIARY {
            let response = self.request(command).await?;
            debug!(%command, %response, "Auxiliary response");
        }

        Ok(outcome)
    }

    /// Poll forever.
    /// Only returns if the link fails.
    pub async fn run(mut self) -> Result<Infallible, Error> {
        info!(
            "Polling every {:?}",
            (self.timing.settle + self.timing.response_latency) * 3
        );

        loop {
            if let Err(e) = self.poll_once().await {
                error!(%e, "Device link failed, polling stops");
                return Err(e);
            }
        }
    }
}

impl<L: DeviceLink + 'static> Poller<L> {
    /// Run the poller on its own task.
    pub fn spawn(self) -> JoinHandle<Result<Infallible, Error>> {
        let span = info_span!("poller", device = %self.link.name());

        tokio::spawn(self.run().instrument(span))
    }
}
