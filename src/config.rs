use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{device::serial_port::DEFAULT_BAUD, error::Error, poller, server::DEFAULT_PORT};

/// Which device to poll, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// The path to the serial port.
    /// Likely "/dev/ttyUSBx" or "COMx".
    pub path: String,

    /// Serial line rate.
    pub baud: u32,

    /// Talk to an in-memory device instead of the serial port.
    pub mock: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".into(),
            baud: DEFAULT_BAUD,
            mock: false,
        }
    }
}

/// Where to accept query clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub host: IpAddr,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

/// The waits around each device request, in milliseconds.
/// See [`poller::Timing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait before writing a command.
    pub settle_ms: u64,

    /// Wait between writing a command and draining the response.
    pub response_latency_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = poller::Timing::default();

        Self {
            settle_ms: timing.settle.as_millis() as u64,
            response_latency_ms: timing.response_latency.as_millis() as u64,
        }
    }
}

impl From<&TimingConfig> for poller::Timing {
    fn from(config: &TimingConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            response_latency: Duration::from_millis(config.response_latency_ms),
        }
    }
}

/// The configuration used for running the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// See [`DeviceConfig`].
    pub device: DeviceConfig,

    /// See [`ServerConfig`].
    pub server: ServerConfig,

    /// See [`TimingConfig`].
    pub timing: TimingConfig,
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, Error> {
        Self::ron()
            .from_str::<Config>(input)
            .map_err(|e| Error::BadConfig(e.to_string()))
    }

    /// An example configuration with every field filled in.
    pub fn example() -> Self {
        Self {
            device: DeviceConfig {
                path: "/dev/ttyUSB1".into(),
                baud: 115_200,
                mock: false,
            },
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 32001,
            },
            timing: TimingConfig::default(),
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> Result<String, Error> {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::BadConfig(e.to_string()))
    }

    /// Setup a new configuration from a RON file.
    pub fn new_from_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let path = p.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| Error::BadConfig(format!("Could not read {path:?}: {e}")))?;

        Self::deserialize(&s)
    }

    /// Check for values the bridge cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.device.mock && self.device.path.trim().is_empty() {
            return Err(Error::BadConfig(
                "A device path is needed unless mocking".into(),
            ));
        }

        if self.device.baud == 0 {
            return Err(Error::BadConfig("Baud must be non-zero".into()));
        }

        if self.timing.response_latency_ms == 0 {
            return Err(Error::BadConfig(
                "The device needs some time to respond, response latency must be non-zero".into(),
            ));
        }

        Ok(())
    }
}
