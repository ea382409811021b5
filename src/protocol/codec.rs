//! Protocol codec
//!
//! Encoding of commands into wire bytes and decoding of server replies
//! read from a buffered stream.
//!
//! Decoders read exactly the lines belonging to one reply, so the stream
//! stays aligned for the next command. Stream failures surface as
//! `MemcacheError::Connection`; replies that break the grammar surface as
//! `MemcacheError::Protocol`.

use std::io::{self, BufRead, ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MemcacheError, Result};
use super::{Command, Stats, Value};

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Longest key the server accepts
pub const MAX_KEY_LENGTH: usize = 250;

/// Largest value block accepted from a `VALUE` header (1 GB, the server's hard cap)
pub const MAX_VALUE_LENGTH: usize = 1024 * 1024 * 1024;

const END: &[u8] = b"END";
const STORED: &[u8] = b"STORED";
const NOT_FOUND: &[u8] = b"NOT_FOUND";
const OK: &[u8] = b"OK";

// =============================================================================
// Command Encoding
// =============================================================================

/// Check that a key can be framed on a command line
///
/// Keys must be 1..=250 bytes with no whitespace or control characters.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(MemcacheError::InvalidKey("key is empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(MemcacheError::InvalidKey(format!(
            "key is {} bytes (max {})",
            key.len(),
            MAX_KEY_LENGTH
        )));
    }
    if key.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(MemcacheError::InvalidKey(format!(
            "key {:?} contains whitespace or control characters",
            key
        )));
    }
    Ok(())
}

/// Encode a command to wire bytes
///
/// Store commands produce the command line followed by the data line.
pub fn encode_command(command: &Command) -> Result<Bytes> {
    if let Some(key) = command.key() {
        validate_key(key)?;
    }

    let keyword = command.command_type().keyword();
    let line = match command {
        Command::Store { key, value, ttl, .. } => {
            format!("{} {} 0 {} {}", keyword, key, ttl, value.len())
        }
        Command::Get { key } | Command::Delete { key } => format!("{} {}", keyword, key),
        Command::Incr { key, amount } | Command::Decr { key, amount } => {
            format!("{} {} {}", keyword, key, amount)
        }
        Command::FlushAll { delay } => format!("{} {}", keyword, delay),
        Command::Stats | Command::Quit => keyword.to_string(),
    };

    let data = match command {
        Command::Store { value, .. } => Some(value.as_slice()),
        _ => None,
    };

    let capacity = line.len() + CRLF.len() + data.map_or(0, |d| d.len() + CRLF.len());
    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_slice(line.as_bytes());
    buf.put_slice(CRLF);
    if let Some(data) = data {
        buf.put_slice(data);
        buf.put_slice(CRLF);
    }

    Ok(buf.freeze())
}

// =============================================================================
// Line Reading
// =============================================================================

/// Read one line, without its terminator
///
/// EOF before a complete line is a connection failure.
pub fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;

    if n == 0 || line.last() != Some(&b'\n') {
        return Err(MemcacheError::Connection(io::Error::new(
            ErrorKind::UnexpectedEof,
            "connection closed mid-reply",
        )));
    }

    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

/// Read one reply line, turning `ERROR` / `CLIENT_ERROR` / `SERVER_ERROR` into errors
fn read_reply_line<R: BufRead + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    let line = read_line(reader)?;

    if line == b"ERROR" {
        return Err(MemcacheError::Server("ERROR".to_string()));
    }
    for prefix in [&b"CLIENT_ERROR"[..], &b"SERVER_ERROR"[..]] {
        if line.starts_with(prefix) && matches!(line.get(prefix.len()).copied(), None | Some(b' ')) {
            return Err(MemcacheError::Server(String::from_utf8_lossy(&line).into_owned()));
        }
    }

    Ok(line)
}

fn line_str(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|_| {
        MemcacheError::protocol(format!(
            "reply line is not valid UTF-8: {:?}",
            String::from_utf8_lossy(line)
        ))
    })
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode a store-family reply: `true` iff `STORED`
pub fn decode_store<R: BufRead + ?Sized>(reader: &mut R) -> Result<bool> {
    let line = read_reply_line(reader)?;
    Ok(line == STORED)
}

/// Decode a `get` reply for `key`
///
/// `END` alone means the key is absent. Otherwise a single
/// `VALUE <key> <flags> <len>` block must follow, terminated by `END`.
pub fn decode_get<R: BufRead + ?Sized>(reader: &mut R, key: &str) -> Result<Option<Value>> {
    let header = read_reply_line(reader)?;
    if header == END {
        return Ok(None);
    }

    let (flags, len) = parse_value_header(line_str(&header)?, key)?;

    // grow with the bytes that actually arrive, not the declared length
    let mut data = Vec::new();
    Read::take(&mut *reader, len as u64).read_to_end(&mut data)?;
    if data.len() < len {
        return Err(MemcacheError::Connection(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("value for {:?} ended after {} of {} bytes", key, data.len(), len),
        )));
    }

    let mut terminator = [0u8; 2];
    reader.read_exact(&mut terminator)?;
    if &terminator[..] != CRLF {
        return Err(MemcacheError::protocol(format!(
            "value for {:?} is longer than its declared {} bytes",
            key, len
        )));
    }

    let end = read_line(reader)?;
    if end != END {
        return Err(MemcacheError::protocol(format!(
            "expected END after value for {:?}, got {:?}",
            key,
            String::from_utf8_lossy(&end)
        )));
    }

    Ok(Some(Value {
        key: key.to_string(),
        flags,
        data,
    }))
}

/// Parse `VALUE <key> <flags> <len> [<cas>]`, returning flags and length
fn parse_value_header(header: &str, key: &str) -> Result<(u32, usize)> {
    let malformed = || MemcacheError::protocol(format!("unexpected get reply: {:?}", header));

    let mut parts = header.split(' ');
    if parts.next() != Some("VALUE") {
        return Err(malformed());
    }

    let reply_key = parts.next().ok_or_else(malformed)?;
    if reply_key != key {
        return Err(MemcacheError::protocol(format!(
            "get reply for key {:?}, requested {:?}",
            reply_key, key
        )));
    }

    let flags = parts
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .ok_or_else(malformed)?;
    let len = parts
        .next()
        .and_then(|l| l.parse::<usize>().ok())
        .ok_or_else(malformed)?;

    // optional cas unique, nothing after it
    if let Some(cas) = parts.next() {
        if cas.parse::<u64>().is_err() || parts.next().is_some() {
            return Err(malformed());
        }
    }

    if len > MAX_VALUE_LENGTH {
        return Err(MemcacheError::protocol(format!(
            "value too large: {} bytes (max {})",
            len, MAX_VALUE_LENGTH
        )));
    }

    Ok((flags, len))
}

/// Decode a `delete` reply: `true` unless `NOT_FOUND`
pub fn decode_delete<R: BufRead + ?Sized>(reader: &mut R) -> Result<bool> {
    let line = read_reply_line(reader)?;
    Ok(line != NOT_FOUND)
}

/// Decode an `incr` / `decr` reply: the new value, or `None` if the key is absent
pub fn decode_counter<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<u64>> {
    let line = read_reply_line(reader)?;
    if line == NOT_FOUND {
        return Ok(None);
    }

    // decr may pad the number with trailing spaces
    let text = line_str(&line)?.trim_end();
    text.parse::<u64>().map(Some).map_err(|_| {
        MemcacheError::protocol(format!("expected counter value, got {:?}", text))
    })
}

/// Decode a `stats` reply: `STAT <name> <value>` lines until `END`
pub fn decode_stats<R: BufRead + ?Sized>(reader: &mut R) -> Result<Stats> {
    let mut stats = Stats::new();

    loop {
        let line = read_reply_line(reader)?;
        if line == END {
            return Ok(stats);
        }

        let text = line_str(&line)?;
        let mut parts = text.splitn(3, ' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("STAT"), Some(name), Some(value)) if !name.is_empty() => {
                stats.insert(name, value);
            }
            _ => {
                return Err(MemcacheError::protocol(format!(
                    "unexpected stats line: {:?}",
                    text
                )))
            }
        }
    }
}

/// Decode a `flush_all` reply: `true` iff `OK`
pub fn decode_flush<R: BufRead + ?Sized>(reader: &mut R) -> Result<bool> {
    let line = read_reply_line(reader)?;
    Ok(line == OK)
}
