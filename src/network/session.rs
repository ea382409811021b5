//! Protocol Session
//!
//! One open connection to a server and its protocol state.
//!
//! ## Model
//! - Fully synchronous: each call writes its command and blocks until the
//!   whole reply has been read
//! - No internal locking; share across threads behind a `Mutex<Session>`
//! - `Open` until `quit`, a transport failure, a malformed reply, or drop
//!
//! ## Results
//! - Negative outcomes (`NOT_FOUND`, `NOT_STORED`, `EXISTS`) are `Ok(false)`
//!   or `Ok(None)`
//! - Transport failures close the session and return
//!   `MemcacheError::Connection`
//! - Malformed replies close the session and return
//!   `MemcacheError::Protocol`

use std::io::BufRead;
use std::time::Duration;

use crate::config::Config;
use crate::error::{MemcacheError, Result};
use crate::protocol::{
    decode_counter, decode_delete, decode_flush, decode_get, decode_stats, decode_store,
    encode_command, Command, Stats, StoreOp, Value,
};
use super::{TcpConnection, Transport};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// A single connection to a memcached server
///
/// Only obtainable through `connect`, `connect_with` or `with_transport`.
pub struct Session<T: Transport = TcpConnection> {
    /// Target host
    host: String,

    /// Target port
    port: u16,

    /// Exclusively owned byte stream
    transport: T,

    state: SessionState,
}

impl Session<TcpConnection> {
    /// Connect to `host:port` within `timeout`
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let config = Config::builder()
            .host(host)
            .port(port)
            .connect_timeout_ms(timeout.as_millis().max(1) as u64)
            .build();
        Self::connect_with(&config)
    }

    /// Connect using a full configuration
    pub fn connect_with(config: &Config) -> Result<Self> {
        let connection = match TcpConnection::open(config) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", config.addr(), e);
                return Err(e);
            }
        };

        tracing::debug!("Connected to {}", connection.peer_addr());
        Ok(Self::with_transport(config.host.clone(), config.port, connection))
    }
}

impl<T: Transport> Session<T> {
    /// Build an open session over an already established transport
    pub fn with_transport(host: impl Into<String>, port: u16, transport: T) -> Self {
        Self {
            host: host.into(),
            port,
            transport,
            state: SessionState::Open,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    // =========================================================================
    // Storage Commands
    // =========================================================================

    /// Store a value unconditionally
    pub fn set(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.store(StoreOp::Set, key, value, 0)
    }

    /// Store a value only if the key does not exist
    pub fn add(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.store(StoreOp::Add, key, value, 0)
    }

    /// Store a value only if the key already exists
    pub fn replace(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.store(StoreOp::Replace, key, value, 0)
    }

    /// Append to an existing value
    pub fn append(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.store(StoreOp::Append, key, value, 0)
    }

    /// Prepend to an existing value
    pub fn prepend(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.store(StoreOp::Prepend, key, value, 0)
    }

    /// Run any store-family operation with a time-to-live in seconds
    ///
    /// Returns `true` iff the server replied `STORED`.
    pub fn store(
        &mut self,
        op: StoreOp,
        key: &str,
        value: impl AsRef<[u8]>,
        ttl: u32,
    ) -> Result<bool> {
        let command = Command::Store {
            op,
            key: key.to_string(),
            value: value.as_ref().to_vec(),
            ttl,
        };
        self.execute(&command, |reader| decode_store(reader))
    }

    // =========================================================================
    // Retrieval / Deletion
    // =========================================================================

    /// Fetch the data stored under `key`
    ///
    /// An empty stored value comes back as `Some(vec![])`, distinct from `None`.
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_value(key)?.map(|value| value.data))
    }

    /// Fetch the full value block (flags included) for `key`
    pub fn get_value(&mut self, key: &str) -> Result<Option<Value>> {
        let command = Command::Get { key: key.to_string() };
        self.execute(&command, |reader| decode_get(reader, key))
    }

    /// Delete `key`; `false` if it did not exist
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let command = Command::Delete { key: key.to_string() };
        self.execute(&command, |reader| decode_delete(reader))
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Increment a counter; `None` if the key does not exist
    pub fn incr(&mut self, key: &str, amount: u64) -> Result<Option<u64>> {
        let command = Command::Incr { key: key.to_string(), amount };
        self.execute(&command, |reader| decode_counter(reader))
    }

    /// Decrement a counter; `None` if the key does not exist
    ///
    /// The server clamps at zero.
    pub fn decr(&mut self, key: &str, amount: u64) -> Result<Option<u64>> {
        let command = Command::Decr { key: key.to_string(), amount };
        self.execute(&command, |reader| decode_counter(reader))
    }

    // =========================================================================
    // Server Commands
    // =========================================================================

    /// Fetch all general-purpose statistics
    pub fn stats(&mut self) -> Result<Stats> {
        self.execute(&Command::Stats, |reader| decode_stats(reader))
    }

    /// Fetch a single statistic by name, filtered client-side
    pub fn stat(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.stats()?.get(name).map(str::to_string))
    }

    /// Invalidate all items immediately
    pub fn flush(&mut self) -> Result<bool> {
        self.flush_all(0)
    }

    /// Invalidate all items after `delay` seconds; `true` iff `OK`
    pub fn flush_all(&mut self, delay: u32) -> Result<bool> {
        self.execute(&Command::FlushAll { delay }, |reader| decode_flush(reader))
    }

    /// Send `quit` and close the connection
    ///
    /// No reply is read. The session is closed afterwards even if the
    /// write fails.
    pub fn quit(&mut self) -> Result<()> {
        self.ensure_open()?;

        let sent = encode_command(&Command::Quit)
            .and_then(|bytes| Ok(self.transport.write_bytes(&bytes)?));
        self.close();

        tracing::debug!("Session to {}:{} quit", self.host, self.port);
        sent
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(MemcacheError::SessionClosed),
        }
    }

    /// Write one command and decode its reply
    fn execute<R, F>(&mut self, command: &Command, decode: F) -> Result<R>
    where
        F: FnOnce(&mut dyn BufRead) -> Result<R>,
    {
        self.ensure_open()?;

        let bytes = encode_command(command)?;
        tracing::trace!(
            "-> {}:{} {} {:?}",
            self.host,
            self.port,
            command.command_type().keyword(),
            command.key()
        );

        let result = self.round_trip(&bytes, decode);

        if let Err(ref e) = result {
            if e.is_connection_failure() {
                tracing::warn!(
                    "Connection to {}:{} failed during {}: {}",
                    self.host,
                    self.port,
                    command.command_type().keyword(),
                    e
                );
                self.close();
            } else if e.is_protocol_fault() {
                // rest of the reply is unread, the stream is out of sync
                tracing::warn!(
                    "Closing {}:{} after malformed {} reply: {}",
                    self.host,
                    self.port,
                    command.command_type().keyword(),
                    e
                );
                self.close();
            } else {
                tracing::debug!("{} failed: {}", command.command_type().keyword(), e);
            }
        }

        result
    }

    fn round_trip<R, F>(&mut self, bytes: &[u8], decode: F) -> Result<R>
    where
        F: FnOnce(&mut dyn BufRead) -> Result<R>,
    {
        self.transport.write_bytes(bytes)?;
        decode(self.transport.reader())
    }

    /// Transition to `Closed` and release the transport
    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        if let Err(e) = self.transport.close() {
            tracing::debug!("Error closing connection to {}:{}: {}", self.host, self.port, e);
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.quit();
        }
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .finish()
    }
}
