use std::io;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::query::codec::LineCodec;

/// A connection to a running bridge.
#[derive(Debug)]
pub struct QueryClient {
    lines: Framed<TcpStream, LineCodec>,
}

impl QueryClient {
    /// Connect to a bridge.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        debug!(peer = ?stream.peer_addr(), "Connected");

        Ok(Self {
            lines: Framed::new(stream, LineCodec::default()),
        })
    }

    /// Send one request line and wait for its reply.
    pub async fn query(&mut self, request: &str) -> io::Result<String> {
        self.lines.send(request.to_string()).await?;

        match self.lines.next().await {
            Some(reply) => reply,
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Server closed the connection",
            )),
        }
    }
}
