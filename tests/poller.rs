use std::{io, time::Duration};

use common::{marked_status, ScriptedLink};
use pretty_assertions::assert_eq;
use sdk_bridge::{
    device::Command,
    error::Error,
    poller::{Outcome, Poller, Timing},
    snapshot::{self, Snapshot},
    status::{self, MalformedFrame},
};
use tokio::time::Instant;

mod common;

fn frame(marker: u8) -> io::Result<Vec<u8>> {
    let mut frame = status::encode(&marked_status(marker));
    frame.extend_from_slice(b"\r\n");
    Ok(frame)
}

fn ack() -> io::Result<Vec<u8>> {
    Ok(b"ACK\r\n".to_vec())
}

#[test]
fn marked_statuses_survive_a_frame() {
    for marker in 0..=u8::MAX {
        let status = marked_status(marker);

        assert_eq!(status::decode(&status::encode(&status)), Ok(status));
    }
}

#[tokio::test(start_paused = true)]
async fn rotation_order_and_timing() {
    let link = ScriptedLink::new([frame(1), ack(), ack()]);
    let writes = link.writes();
    let (writer, _reader) = snapshot::channel();
    let mut poller = Poller::new(link, writer, Timing::default());

    let start = Instant::now();
    poller.poll_once().await.unwrap();
    let elapsed = start.elapsed();

    let writes = writes.lock().unwrap();
    let sent = writes
        .iter()
        .map(|(at, bytes)| (*at - start, bytes.clone()))
        .collect::<Vec<_>>();

    assert_eq!(
        sent,
        vec![
            (Duration::from_millis(700), b"TSC10173\r\n".to_vec()),
            (Duration::from_millis(1550), b"TSC11576\r\n".to_vec()),
            (
                Duration::from_millis(2400),
                b"TSC1C105000000000005\r\n".to_vec()
            ),
        ]
    );
    assert_eq!(elapsed, Duration::from_millis(2550));
}

#[tokio::test(start_paused = true)]
async fn good_frame_is_published() {
    let (writer, reader) = snapshot::channel();
    let mut poller = Poller::new(
        ScriptedLink::new([frame(7), ack(), ack()]),
        writer,
        Timing::default(),
    );

    assert_eq!(reader.get(), Snapshot::NotYetAvailable);

    let outcome = poller.poll_once().await.unwrap();

    assert_eq!(outcome, Outcome::Published);
    assert_eq!(reader.get().status(), Some(&marked_status(7)));
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_keeps_previous() {
    let (writer, reader) = snapshot::channel();
    let mut poller = Poller::new(
        ScriptedLink::new([
            frame(3),
            ack(),
            ack(),
            Ok(b"TSC1 garbled".to_vec()),
            ack(),
            ack(),
        ]),
        writer,
        Timing::default(),
    );

    poller.poll_once().await.unwrap();
    let before = reader.get();

    let outcome = poller.poll_once().await.unwrap();

    assert_eq!(outcome, Outcome::Rejected(MalformedFrame::TooShort { len: 12 }));
    assert_eq!(reader.get(), before);
    assert_eq!(reader.get().status(), Some(&marked_status(3)));
}

#[tokio::test(start_paused = true)]
async fn non_hex_field_keeps_previous() {
    let mut bad = frame(4).unwrap();
    bad[6] = b'X';

    let (writer, reader) = snapshot::channel();
    let mut poller = Poller::new(
        ScriptedLink::new([frame(2), ack(), ack(), Ok(bad), ack(), ack()]),
        writer,
        Timing::default(),
    );

    poller.poll_once().await.unwrap();
    let outcome = poller.poll_once().await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Rejected(MalformedFrame::BadField {
            field: "hardware version",
            ..
        })
    ));
    assert_eq!(reader.get().status(), Some(&marked_status(2)));
}

#[tokio::test(start_paused = true)]
async fn silence_keeps_nothing_available() {
    let (writer, reader) = snapshot::channel();
    let mut poller = Poller::new(ScriptedLink::new([]), writer, Timing::default());

    let outcome = poller.poll_once().await.unwrap();

    assert_eq!(outcome, Outcome::NoData);
    assert_eq!(reader.get(), Snapshot::NotYetAvailable);
}

#[tokio::test(start_paused = true)]
async fn auxiliary_responses_are_not_decoded() {
    let (writer, reader) = snapshot::channel();
    let mut poller = Poller::new(
        ScriptedLink::new([frame(1), frame(8), frame(9)]),
        writer,
        Timing::default(),
    );

    poller.poll_once().await.unwrap();

    assert_eq!(reader.get().status(), Some(&marked_status(1)));
}

#[tokio::test(start_paused = true)]
async fn request_drains_once() {
    let (writer, _reader) = snapshot::channel();
    let mut poller = Poller::new(
        ScriptedLink::new([ack(), frame(5)]),
        writer,
        Timing::default(),
    );

    let first = poller.request(Command::Auxiliary1576).await.unwrap();
    let second = poller.request(Command::Auxiliary1576).await.unwrap();

    assert_eq!(first.to_string(), "ACK");
    assert_ne!(first, second);
}

#[tokio::test(start_paused = true)]
async fn write_failure_is_fatal() {
    let (writer, reader) = snapshot::channel();
    let link = ScriptedLink::new([frame(6), ack(), ack()]).fail_write(3);

    let result = Poller::new(link, writer, Timing::default()).run().await;

    assert!(matches!(result, Err(Error::DeviceIo { ref path, .. }) if path == "scripted"));

    // What was published before the failure stays readable.
    assert_eq!(reader.get().status(), Some(&marked_status(6)));
}

#[tokio::test(start_paused = true)]
async fn read_failure_is_fatal() {
    let (writer, _reader) = snapshot::channel();
    let link = ScriptedLink::new([Err(io::Error::new(
        io::ErrorKind::Other,
        "device went away",
    ))]);

    let result = Poller::new(link, writer, Timing::default()).spawn().await.unwrap();

    match result {
        Err(Error::DeviceIo { source, .. }) => {
            assert_eq!(source.to_string(), "device went away")
        }
        other => panic!("Expected a device error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn custom_timing_is_honored() {
    let link = ScriptedLink::new([frame(1), ack(), ack()]);
    let (writer, _reader) = snapshot::channel();
    let timing = Timing {
        settle: Duration::from_millis(10),
        response_latency: Duration::from_millis(5),
    };
    let mut poller = Poller::new(link, writer, timing);

    let start = Instant::now();
    poller.poll_once().await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(45));
}
