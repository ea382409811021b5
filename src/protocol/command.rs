//! Command definitions
//!
//! Represents requests sent to the server.

/// Default delta for `incr` / `decr`
pub const DEFAULT_COUNTER_DELTA: u64 = 1;

/// Store-family operations sharing the two-line request framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store unconditionally
    Set,
    /// Store only if the key is absent
    Add,
    /// Store only if the key is present
    Replace,
    /// Append to an existing value
    Append,
    /// Prepend to an existing value
    Prepend,
}

impl StoreOp {
    /// Protocol keyword for this operation
    pub fn keyword(&self) -> &'static str {
        match self {
            StoreOp::Set => "set",
            StoreOp::Add => "add",
            StoreOp::Replace => "replace",
            StoreOp::Append => "append",
            StoreOp::Prepend => "prepend",
        }
    }
}

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Store(StoreOp),
    Get,
    Delete,
    Incr,
    Decr,
    Stats,
    FlushAll,
    Quit,
}

impl CommandType {
    /// Protocol keyword that starts the command line
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandType::Store(op) => op.keyword(),
            CommandType::Get => "get",
            CommandType::Delete => "delete",
            CommandType::Incr => "incr",
            CommandType::Decr => "decr",
            CommandType::Stats => "stats",
            CommandType::FlushAll => "flush_all",
            CommandType::Quit => "quit",
        }
    }
}

/// A request to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// set/add/replace/append/prepend a value
    Store {
        op: StoreOp,
        key: String,
        value: Vec<u8>,
        ttl: u32,
    },

    /// Fetch a single key
    Get { key: String },

    /// Delete a key
    Delete { key: String },

    /// Increment a counter
    Incr { key: String, amount: u64 },

    /// Decrement a counter (the server clamps at zero)
    Decr { key: String, amount: u64 },

    /// Fetch general-purpose statistics
    Stats,

    /// Invalidate all items after `delay` seconds
    FlushAll { delay: u32 },

    /// Ask the server to close the connection
    Quit,
}

impl Command {
    /// Store command with no expiration
    pub fn store(op: StoreOp, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Command::Store {
            op,
            key: key.into(),
            value: value.into(),
            ttl: 0,
        }
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Store { op, .. } => CommandType::Store(*op),
            Command::Get { .. } => CommandType::Get,
            Command::Delete { .. } => CommandType::Delete,
            Command::Incr { .. } => CommandType::Incr,
            Command::Decr { .. } => CommandType::Decr,
            Command::Stats => CommandType::Stats,
            Command::FlushAll { .. } => CommandType::FlushAll,
            Command::Quit => CommandType::Quit,
        }
    }

    /// Key addressed by this command, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Command::Store { key, .. }
            | Command::Get { key }
            | Command::Delete { key }
            | Command::Incr { key, .. }
            | Command::Decr { key, .. } => Some(key.as_str()),
            Command::Stats | Command::FlushAll { .. } | Command::Quit => None,
        }
    }
}
