use std::{fmt::Display, future::Future, io};

/// The real serial port link.
pub mod serial_port;

/// An in-memory device, useful to run without the actual hardware.
pub mod mock;

/// The bytes of every command end with this.
pub const TERMINATOR: &[u8] = b"\r\n";

/// A byte oriented channel to the device.
///
/// The poller is the only user of a link, so methods take `&mut self`.
/// Any error returned is treated as the device being gone.
pub trait DeviceLink: Send {
    /// Put these bytes on the wire.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Take whatever bytes the device has sent since the last call.
    /// Empty if nothing is pending.
    fn read_available(&mut self) -> impl Future<Output = io::Result<Vec<u8>>> + Send;

    /// Something to identify the link by in logs, such as the tty path.
    fn name(&self) -> &str;
}

/// The commands the device understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Ask for the status frame.
    StatusRequest,

    /// First auxiliary command.
    /// The response is read but carries nothing we decode.
    Auxiliary1576,

    /// Second auxiliary command.
    /// The response is read but carries nothing we decode.
    AuxiliaryC105,
}

impl Command {
    /// The commands sent after each status request, in order.
    pub const AUXILIARY: [Command; 2] = [Command::Auxiliary1576, Command::AuxiliaryC105];

    /// The command text, without terminator.
    pub fn body(&self) -> &'static str {
        match self {
            Command::StatusRequest => "TSC10173",
            Command::Auxiliary1576 => "TSC11576",
            Command::AuxiliaryC105 => "TSC1C105000000000005",
        }
    }

    /// The bytes to write, including the terminator.
    pub fn to_wire(&self) -> Vec<u8> {
        [self.body().as_bytes(), TERMINATOR].concat()
    }

    /// Recognize a command as written by [`Command::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Option<Self> {
        let body = bytes.strip_suffix(TERMINATOR)?;

        [Command::StatusRequest, Command::Auxiliary1576, Command::AuxiliaryC105]
            .into_iter()
            .find(|command| command.body().as_bytes() == body)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.body())
    }
}

/// What came back after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The device said something.
    Data(Vec<u8>),

    /// Nothing was pending when we looked.
    NoData,
}

impl From<Vec<u8>> for Response {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Self::NoData
        } else {
            Self::Data(bytes)
        }
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Data(bytes) => {
                let s = String::from_utf8_lossy(bytes)
                    .chars()
                    .take(48)
                    .collect::<String>();

                write!(f, "{}", s.trim())
            }
            Response::NoData => write!(f, "<no data>"),
        }
    }
}
