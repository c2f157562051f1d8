#![deny(missing_docs)]

//! This crate shares a single serial attached monitoring device with many network clients.
//!
//! A poller owns the serial port. On a fixed cadence it asks the device for its status,
//! decodes the response, and publishes it as the latest snapshot.
//! Two auxiliary commands follow each status request.
//!
//! Clients connect over TCP and send one request per line, such as `get_hw`.
//! Each request gets exactly one reply line, read from the latest snapshot.
//! Anything not understood is answered with the list of known requests.
//!
//! Bad frames from the device are skipped and never replace a good snapshot.
//! A failing serial port stops the process, which is expected to be restarted.

/// Status frame decoding (and encoding, for mocks and tests).
pub mod status;

/// The link to the device, and the commands sent over it.
pub mod device;

/// Polls the device and publishes what it decodes.
pub mod poller;

/// The latest status, shared between the poller and the query connections.
pub mod snapshot;

/// The requests clients may send, and how they are answered.
pub mod query;

/// Code relating to setting up the server which accepts connections and spawns handlers for clients.
pub mod server;

/// A client for the query protocol.
pub mod client;

/// The command line interface.
pub mod cli;

/// Relates to config files.
pub mod config;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;
