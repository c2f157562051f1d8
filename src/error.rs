use std::{io, net::SocketAddr};

use thiserror::Error;

use crate::status::MalformedFrame;

/// Errors thay may occur in this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A device response could not be decoded.
    /// Recoverable: the previous snapshot is kept and polling continues.
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] MalformedFrame),

    /// The device link failed.
    /// Not recoverable, the process is expected to be restarted by a supervisor.
    #[error("Device I/O problem on `{path}`")]
    DeviceIo {
        /// The tty (or mock name) the problem occurred on.
        path: String,

        /// The underlying problem.
        #[source]
        source: io::Error,
    },

    /// A query client went away mid-conversation.
    /// Only that connection is affected.
    #[error("Client disconnected")]
    ClientDisconnected(#[source] io::Error),

    /// The query server could not start listening.
    #[error("Could not listen on `{addr}`")]
    Listen {
        /// Where we tried to listen.
        addr: SocketAddr,

        /// The underlying problem.
        #[source]
        source: io::Error,
    },

    /// The configuration (file or command line) is not usable.
    #[error("Bad configuration. Problem: `{0}`")]
    BadConfig(String),
}

impl Error {
    pub(crate) fn device_io(path: &str, source: io::Error) -> Self {
        Self::DeviceIo {
            path: path.into(),
            source,
        }
    }
}
