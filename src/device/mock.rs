//! A mock device, useful to run the bridge without the actual hardware.

use std::io;

use tracing::{debug, trace, warn};

use crate::{
    device::{Command, DeviceLink, TERMINATOR},
    status::{self, DeviceStatus},
};

/// Answers the status request with a frame built from a fixed [`DeviceStatus`],
/// and acknowledges any other known command by echoing it back.
#[derive(Debug)]
pub struct MockDevice {
    name: String,
    status: DeviceStatus,
    pending: Vec<u8>,
}

impl MockDevice {
    /// A mock which will report the given status.
    pub fn new(name: &str, status: DeviceStatus) -> Self {
        debug!(%name, "Running mock device");

        Self {
            name: name.into(),
            status,
            pending: vec![],
        }
    }

    /// Report a different status from now on.
    pub fn set_status(&mut self, status: DeviceStatus) {
        self.status = status;
    }
}

impl DeviceLink for MockDevice {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match Command::from_wire(bytes) {
            Some(Command::StatusRequest) => {
                self.pending.extend(status::encode(&self.status));
                self.pending.extend_from_slice(TERMINATOR);
            }
            Some(command) => {
                trace!(%command, "Echoing auxiliary command");
                self.pending.extend(command.to_wire());
            }
            None => {
                // A real device would likely stay quiet too.
                warn!("Mock got unknown command: `{}`", String::from_utf8_lossy(bytes));
            }
        }

        Ok(())
    }

    async fn read_available(&mut self) -> io::Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.pending))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
