//! # memline
//!
//! A blocking, single-connection client for the memcached text protocol:
//! - Storage commands (set / add / replace / append / prepend)
//! - Retrieval and deletion
//! - Counters (incr / decr)
//! - Statistics and flush
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Caller                              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  set / get / incr / stats ...
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Session                              │
//! │                    (Open / Closed)                           │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │ Command Encoder │                │ Response Decoder│
//!   └────────┬────────┘                └────────▲────────┘
//!            │                                  │
//!            ▼                                  │
//!   ┌─────────────────────────────────────────────────────┐
//!   │                 Transport (TCP)                      │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use memline::Session;
//!
//! # fn main() -> memline::Result<()> {
//! let mut session = Session::connect("127.0.0.1", 11211, Duration::from_secs(5))?;
//! assert!(session.set("foo", "bar")?);
//! assert_eq!(session.get("foo")?, Some(b"bar".to_vec()));
//! assert!(!session.add("foo", "baz")?);
//! session.quit()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemcacheError, Result};
pub use config::Config;
pub use network::{Session, SessionState, TcpConnection, Transport};
pub use protocol::{Stats, StoreOp, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
