use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Requests longer than this are not something any client of ours sends.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Splits incoming bytes on `\n` into strings, dropping a trailing `\r`.
/// Writes each string followed by `\n`.
///
/// Used on both ends of a query connection.
#[derive(Debug)]
pub struct LineCodec {
    /// How far we have looked for a newline into the buffer
    cursor: usize,

    /// Longest line accepted, not counting the delimiter.
    max_length: usize,
}

impl LineCodec {
    /// Create a new codec.
    pub fn new(max_length: usize) -> Self {
        Self {
            cursor: 0,
            max_length,
        }
    }

    fn line(&self, bytes: &[u8]) -> Result<String, io::Error> {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

        if bytes.len() > self.max_length {
            return Err(self.too_long());
        }

        Ok(String::from_utf8_lossy(bytes).to_string())
    }

    fn too_long(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Line longer than {} bytes", self.max_length),
        )
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(MAX_LINE_LENGTH)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let read_to = src.len();

        let look_at = &src[self.cursor..read_to];

        if let Some(position) = look_at.iter().position(|&byte| byte == b'\n') {
            // Since we might "start late" in the buffer (from the cursor),
            // the "global" position within the buffer has to be calculated.
            let actual_position = self.cursor + position;

            // Next time we need to start over.
            self.cursor = 0;

            // Split at the delimiter, getting a slice of the bytes before it.
            let line = src.split_to(actual_position);

            // Discard the newline by advancing the source buffer beyond it.
            src.advance(1);

            self.line(&line).map(Some)
        } else if read_to > self.max_length + 1 {
            // Even a trailing `\r` would not bring this under the limit.
            Err(self.too_long())
        } else {
            // No full line yet. We will be handed the same buffer again,
            // possibly with more data, so no need to look at these bytes twice.
            self.cursor = read_to;

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.cursor = 0;

        if src.is_empty() {
            Ok(None)
        } else {
            // The peer closed without a final newline.
            let rest = src.split_to(src.len());
            self.line(&rest).map(Some)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
