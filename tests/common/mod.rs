#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use color_eyre::Result;
use sdk_bridge::{
    client::QueryClient,
    device::DeviceLink,
    snapshot::SnapshotReader,
    status::{layout::DRY_CONTACTS, DeviceStatus, OpticalRelays},
};
use tokio::{sync::oneshot, time::timeout};
use tracing::info;

/// A write as seen by a [`ScriptedLink`], with the (possibly paused) time it happened.
pub type Writes = Arc<Mutex<Vec<(tokio::time::Instant, Vec<u8>)>>>;

/// A device link replaying canned read results, one per `read_available`.
/// Once the script runs out, reads return nothing.
pub struct ScriptedLink {
    reads: VecDeque<io::Result<Vec<u8>>>,
    writes: Writes,
    failing_write: Option<usize>,
}

impl ScriptedLink {
    pub fn new<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = io::Result<Vec<u8>>>,
    {
        Self {
            reads: reads.into_iter().collect(),
            writes: Writes::default(),
            failing_write: None,
        }
    }

    /// Make the n-th write (counting from zero) fail.
    pub fn fail_write(mut self, n: usize) -> Self {
        self.failing_write = Some(n);
        self
    }

    pub fn writes(&self) -> Writes {
        self.writes.clone()
    }
}

impl DeviceLink for ScriptedLink {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut writes = self.writes.lock().unwrap();

        if self.failing_write == Some(writes.len()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }

        writes.push((tokio::time::Instant::now(), bytes.to_vec()));
        Ok(())
    }

    async fn read_available(&mut self) -> io::Result<Vec<u8>> {
        self.reads.pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A status where every field is derived from the marker,
/// so a reply can be checked against it.
///
/// Every field holds a value a frame can carry, so the status
/// survives being encoded and decoded again.
pub fn marked_status(marker: u8) -> DeviceStatus {
    DeviceStatus {
        hardware_version: marker,
        software_version: marker,
        self_temperature: marker,
        relay_state: marker % 10,
        optical_relay_state: OpticalRelays::from_bits(
            [3, 2, 1, 0].map(|shift| (marker >> shift) & 1 == 1),
        ),
        dry_contact_state: [b'0' + marker % 10; DRY_CONTACTS],
    }
}

pub async fn start_server(reader: SnapshotReader) -> u16 {
    let (port_tx, port_rx) = oneshot::channel();

    tokio::spawn(async move { sdk_bridge::server::run_any_port(reader, port_tx).await });
    port_rx
        .await
        .expect("Server should reply with allocated port")
}

pub async fn connect(port: u16) -> Result<QueryClient> {
    info!("Connecting to server on port {port}");

    Ok(QueryClient::connect(("127.0.0.1", port)).await?)
}

pub async fn query(client: &mut QueryClient, request: &str) -> Result<String> {
    let reply = timeout(Duration::from_secs(5), client.query(request)).await??;

    Ok(reply)
}
