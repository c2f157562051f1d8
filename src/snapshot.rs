//! The latest decoded device status, shared between the poller and every query connection.
//!
//! There is exactly one [`SnapshotWriter`], owned by whoever polls the device.
//! [`SnapshotReader`]s are cheap to clone and never block each other or the writer
//! for longer than it takes to clone an [`Arc`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::status::DeviceStatus;

/// What a reader sees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Snapshot {
    /// Nothing has been decoded since startup.
    #[default]
    NotYetAvailable,

    /// The most recently decoded status.
    Available(Arc<DeviceStatus>),
}

impl Snapshot {
    /// Borrow the status, if there is one.
    pub fn status(&self) -> Option<&DeviceStatus> {
        match self {
            Snapshot::NotYetAvailable => None,
            Snapshot::Available(status) => Some(status),
        }
    }
}

/// Create an empty store.
/// The returned reader may be cloned freely.
pub fn channel() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(Snapshot::NotYetAvailable);

    (SnapshotWriter { tx }, SnapshotReader { rx })
}

/// The single writing side of the store.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotWriter {
    /// Replace the current status.
    /// Readers either see the previous status or this one, never a mix.
    pub fn set(&self, status: DeviceStatus) {
        self.tx.send_replace(Snapshot::Available(Arc::new(status)));
    }

    /// Get another reader.
    pub fn subscribe(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// A reading side of the store.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Snapshot>,
}

impl SnapshotReader {
    /// The current snapshot.
    pub fn get(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait until the writer publishes something not yet seen by this reader.
    /// Returns `false` if the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::status::{layout::DRY_CONTACTS, OpticalRelays};

    fn status(marker: u8) -> DeviceStatus {
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

    fn is_whole(status: &DeviceStatus) -> bool {
        *status == self::status(status.hardware_version)
    }

    #[test]
    fn starts_empty() {
        let (_writer, reader) = channel();

        assert_eq!(reader.get(), Snapshot::NotYetAvailable);
        assert_eq!(reader.get().status(), None);
    }

    #[test]
    fn set_is_visible_to_every_reader() {
        let (writer, reader) = channel();
        let other = reader.clone();
        let late = writer.subscribe();

        writer.set(status(3));

        for reader in [reader, other, late] {
            assert_eq!(reader.get().status(), Some(&status(3)));
        }
    }

    #[test]
    fn last_set_wins() {
        let (writer, reader) = channel();

        writer.set(status(1));
        writer.set(status(2));

        assert_eq!(reader.get().status(), Some(&status(2)));
    }

    #[test]
    fn get_works_after_writer_is_gone() {
        let (writer, reader) = channel();
        writer.set(status(4));
        drop(writer);

        assert_eq!(reader.get().status(), Some(&status(4)));
    }

    #[tokio::test]
    async fn changed_wakes_on_set() {
        let (writer, mut reader) = channel();

        let waiter = tokio::spawn(async move {
            assert!(reader.changed().await);
            reader.get()
        });

        writer.set(status(5));

        let seen = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen.status(), Some(&status(5)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_only_see_whole_statuses() {
        let (writer, reader) = channel();

        let readers = (0..8)
            .map(|_| {
                let reader = reader.clone();
                tokio::spawn(async move {
                    let mut seen = vec![];
                    for _ in 0..2_000 {
                        if let Snapshot::Available(status) = reader.get() {
                            assert!(is_whole(&status), "Torn read: {status:?}");
                            seen.push(status.hardware_version);
                        }
                        tokio::task::yield_now().await;
                    }
                    seen
                })
            })
            .collect::<Vec<_>>();

        for marker in 0..=200u8 {
            writer.set(status(marker));
            tokio::task::yield_now().await;
        }

        for handle in readers {
            let seen = handle.await.unwrap();

            // Single writer, so each reader sees markers in publish order.
            assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}
