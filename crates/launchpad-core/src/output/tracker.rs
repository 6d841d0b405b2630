//! Line tracker: a codec that turns a raw byte stream into text lines.
//!
//! Bytes are accumulated until a `\n` arrives and only then decoded, so a
//! multi-byte UTF-8 character split across two reads is decoded intact.
//! Invalid sequences are replaced rather than rejected.

use std::io;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::warn;

use super::{OutputCategory, OutputEvent, OutputSink};

/// Splits on `\n`, keeping the terminator on each line. The unterminated
/// tail of the stream is emitted at EOF.
#[derive(Debug, Default)]
pub struct LineTracker {
    /// Bytes of the buffer already scanned without finding a newline.
    scanned: usize,
}

impl Decoder for LineTracker {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        let start = self.scanned.min(src.len());
        match src[start..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                self.scanned = 0;
                let line = src.split_to(start + offset + 1);
                Ok(Some(String::from_utf8_lossy(&line).into_owned()))
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.scanned = 0;
        if src.is_empty() {
            Ok(None)
        } else {
            let rest = src.split();
            Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
        }
    }
}

/// Read `reader` to EOF, emitting one `category` event per line.
pub async fn track_lines<R>(reader: R, category: OutputCategory, sink: &dyn OutputSink)
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LineTracker::default());
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => sink.output(OutputEvent::new(category, line)),
            Err(e) => {
                warn!(?category, error = %e, "error reading process output");
                break;
            }
        }
    }
}
