use std::{
    future::Future,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
    sync::oneshot,
};
use tokio_util::codec::Framed;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::{error::Error, query, query::codec::LineCodec, snapshot::SnapshotReader};

/// The default port to run the server on.
pub const DEFAULT_PORT: u16 = 10500;

/// Pause after a failed accept, such as when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Answer requests on a single connection until the peer closes it.
///
/// Every request line gets exactly one reply line.
/// Only the snapshot is read, so this never waits on the device.
pub async fn handle_connection<S>(stream: S, reader: SnapshotReader) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut lines = Framed::new(stream, LineCodec::default());

    while let Some(request) = lines.next().await {
        let request = request.map_err(Error::ClientDisconnected)?;
        let reply = query::reply(&request, &reader.get());

        trace!(%request, %reply, "Replying");

        lines.send(reply).await.map_err(Error::ClientDisconnected)?;
    }

    Ok(())
}

async fn accept_retrying<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                warn!(%e, "Accept failed, retrying in {ACCEPT_BACKOFF:?}");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Accept connections forever, each handled on its own task.
pub async fn serve(listener: TcpListener, reader: SnapshotReader) {
    loop {
        let (stream, peer) = accept_retrying(|| listener.accept()).await;

        debug!(%peer, "Connected");

        let reader = reader.clone();
        tokio::spawn(
            async move {
                match handle_connection(stream, reader).await {
                    Ok(()) => debug!("Peer closed the connection"),
                    Err(e) => info!(%e, "Connection dropped"),
                }
            }
            .instrument(info_span!("client", %peer)),
        );
    }
}

async fn run(
    reader: SnapshotReader,
    addr: SocketAddr,
    allocated_port: Option<oneshot::Sender<u16>>,
) -> Result<(), Error> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Listen { addr, source })?;
    let addr = listener
        .local_addr()
        .map_err(|source| Error::Listen { addr, source })?;

    if let Some(port_reply) = allocated_port {
        // Nobody waiting for the port is fine.
        let _ = port_reply.send(addr.port());
    }

    info!("listening on {}", addr);

    serve(listener, reader).await;

    Ok(())
}

/// Start the server on an arbitrary available port on localhost.
/// The port allocated will be sent on the provided channel.
pub async fn run_any_port(
    reader: SnapshotReader,
    allocated_port: oneshot::Sender<u16>,
) -> Result<(), Error> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));

    run(reader, addr, Some(allocated_port)).await
}

/// Start the server on the given address and port.
pub async fn run_on_port(reader: SnapshotReader, host: IpAddr, port: u16) -> Result<(), Error> {
    run(reader, SocketAddr::new(host, port), None).await
}
