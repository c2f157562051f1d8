use std::{net::IpAddr, path::PathBuf};

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::{
    config::Config,
    error::Error,
    server::DEFAULT_PORT,
    status::{self, DeviceStatus},
};

/// The command line interface for the bridge.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a configuration file
    pub config: Option<PathBuf>,

    /// Serial port of the device, overrides the configuration file
    #[arg(long)]
    pub device: Option<String>,

    /// Serial line rate, overrides the configuration file
    #[arg(long)]
    pub baud: Option<u32>,

    /// Address to accept query clients on, overrides the configuration file
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to accept query clients on, overrides the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Poll an in-memory device instead of a serial port
    #[arg(long)]
    pub mock: bool,

    /// Log level of terminal output (`RUST_LOG` takes precedence)
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,

    /// Also log to daily rotated files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Let command line flags take precedence over the configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.device.path = device.clone();
        }
        if let Some(baud) = self.baud {
            config.device.baud = baud;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.mock {
            config.device.mock = true;
        }
    }
}

/// Commands available in the command line interface.
#[derive(Subcommand)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),

    /// Send a single request to a running bridge and print the reply.
    Query {
        /// Server address.
        #[arg(short, long, default_value = "127.0.0.1")]
        address: String,

        /// Server port.
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// The request, e.g. `get_hw`.
        request: String,
    },
}

/// Helpful examples for users.
#[derive(Subcommand, Clone)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,

    /// Show an example status frame, as the device would send it.
    Frame,
}

/// Print the requested example.
pub fn handle_example(example: Examples) -> Result<(), Error> {
    match example {
        Examples::Config => println!("{}", Config::example().serialize_pretty()?),
        Examples::Frame => {
            let frame = status::encode(&DeviceStatus::example());
            println!("{}", String::from_utf8_lossy(&frame));
        }
    }

    Ok(())
}
