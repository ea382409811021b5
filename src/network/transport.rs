//! Transport abstraction
//!
//! The session only needs to write raw bytes, read buffered lines and
//! close the stream. Anything offering those can carry the protocol.

use std::io::{self, BufRead};

/// Bidirectional byte stream used by a `Session`
pub trait Transport {
    /// Write all bytes and flush them to the peer
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Buffered read half of the stream
    fn reader(&mut self) -> &mut dyn BufRead;

    /// Release the stream; further reads and writes fail
    fn close(&mut self) -> io::Result<()>;
}
