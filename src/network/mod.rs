//! Network Module
//!
//! Byte-stream transport and the protocol session built on it.
//!
//! ## Architecture
//! - `Transport`: line-read / raw-write / close primitives
//! - `TcpConnection`: buffered TCP implementation of `Transport`
//! - `Session`: one open connection and its protocol state

mod transport;
mod connection;
mod session;

pub use transport::Transport;
pub use connection::TcpConnection;
pub use session::{Session, SessionState};
