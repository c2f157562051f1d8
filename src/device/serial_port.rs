use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace};

use crate::{device::DeviceLink, error::Error};

/// The device talks at this rate unless told otherwise.
pub const DEFAULT_BAUD: u32 = 57_600;

/// Stop draining after this many bytes, even if the device keeps talking.
const MAX_RESPONSE: usize = 4096;

/// Builder for a [`SerialLink`].
#[derive(Debug)]
pub struct SerialLinkBuilder {
    baud: Option<u32>,
    path: String,
}

fn try_create_serial_port(baud: u32, path: &str) -> Result<SerialStream, Error> {
    tokio_serial::new(path, baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| Error::device_io(path, e.into()))
}

impl SerialLinkBuilder {
    /// Start a new builder.
    /// The tty should likely be along the lines of `/dev/ttyUSBx` on unix, and `COMx` on Windows.
    pub fn new(tty: &str) -> Self {
        Self {
            baud: None,
            path: tty.to_string(),
        }
    }

    /// Set the baud.
    /// Will use [`DEFAULT_BAUD`] if not set.
    pub fn set_baud(mut self, baud: u32) -> Self {
        self.baud = Some(baud);
        self
    }

    /// Open the port.
    /// Failing to do so is not something polling can recover from.
    pub fn build(self) -> Result<SerialLink, Error> {
        let baud = self.baud.unwrap_or(DEFAULT_BAUD);
        debug!(%self.path, %baud, "Opening port");

        let stream = try_create_serial_port(baud, &self.path)?;
        info!("Connected to serial port at {}", self.path);

        Ok(SerialLink {
            path: self.path,
            stream,
        })
    }
}

/// A [`DeviceLink`] over a serial port.
pub struct SerialLink {
    path: String,
    stream: SerialStream,
}

impl DeviceLink for SerialLink {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut response = vec![];

        while response.len() < MAX_RESPONSE {
            let pending = self.stream.bytes_to_read().map_err(io::Error::from)? as usize;
            if pending == 0 {
                break;
            }

            let start = response.len();
            response.resize(start + pending, 0);
            self.stream.read_exact(&mut response[start..]).await?;
        }

        trace!(
            "Drained {} byte(s): `{:?}`",
            response.len(),
            &response[..response.len().min(32)]
        );

        Ok(response)
    }

    fn name(&self) -> &str {
        &self.path
    }
}
