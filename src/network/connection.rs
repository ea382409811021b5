//! TCP Connection
//!
//! Buffered TCP transport to a single server.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::error::Result;
use super::Transport;

/// A TCP stream split into buffered read and write halves
pub struct TcpConnection {
    /// TCP stream reader (buffered for line reads)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered so a command goes out in one flush)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpConnection {
    /// Open a connection to `config.host:config.port`
    ///
    /// Every resolved address is tried in turn within the connect timeout.
    /// Resolution failure, refusal and timeout all come back as
    /// `MemcacheError::Connection`.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let addrs = (config.host.as_str(), config.port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
                Ok(stream) => return Self::from_stream(stream, config),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{} did not resolve to any address", config.addr()),
                )
            })
            .into())
    }

    /// Wrap an already connected stream
    ///
    /// Applies TCP_NODELAY and the read/write timeouts from `config`.
    pub fn from_stream(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Transport for TcpConnection {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }

    fn reader(&mut self) -> &mut dyn BufRead {
        &mut self.reader
    }

    fn close(&mut self) -> io::Result<()> {
        // the peer may already have hung up (e.g. after `quit`)
        let _ = self.writer.flush();
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}
