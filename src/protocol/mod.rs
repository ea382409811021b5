//! Protocol Module
//!
//! Encoding of requests and decoding of replies for the memcached text
//! protocol. Every line ends with `\r\n`.
//!
//! ### Requests
//! ```text
//! <set|add|replace|append|prepend> <key> 0 <ttl> <len>\r\n<data>\r\n
//! get <key>\r\n
//! delete <key>\r\n
//! <incr|decr> <key> <amount>\r\n
//! stats\r\n
//! flush_all <delay>\r\n
//! quit\r\n
//! ```
//!
//! ### Replies
//! - store:   `STORED` | `NOT_STORED` | `EXISTS` | `NOT_FOUND`
//! - get:     `VALUE <key> <flags> <len>\r\n<data>\r\nEND` | `END`
//! - delete:  `DELETED` | `NOT_FOUND`
//! - counter: `<u64>` | `NOT_FOUND`
//! - stats:   `STAT <name> <value>`* `END`
//! - flush:   `OK`
//! - any:     `ERROR` | `CLIENT_ERROR <msg>` | `SERVER_ERROR <msg>`

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType, StoreOp, DEFAULT_COUNTER_DELTA};
pub use response::{Stats, Value};
pub use codec::{
    encode_command, validate_key, read_line,
    decode_store, decode_get, decode_delete, decode_counter, decode_stats, decode_flush,
    CRLF, MAX_KEY_LENGTH, MAX_VALUE_LENGTH,
};
