//! memline CLI Client
//!
//! Command-line interface for issuing single commands to a memcached server.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use memline::protocol::DEFAULT_COUNTER_DELTA;
use memline::{Config, Session, StoreOp};
use tracing_subscriber::{fmt, EnvFilter};

/// memline CLI
#[derive(Parser, Debug)]
#[command(name = "memline-cli")]
#[command(about = "CLI for memcached-compatible servers")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "11211")]
    port: u16,

    /// Connect timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Store a value unconditionally
    Set(StoreArgs),

    /// Store a value only if the key does not exist
    Add(StoreArgs),

    /// Store a value only if the key exists
    Replace(StoreArgs),

    /// Append to an existing value
    Append(StoreArgs),

    /// Prepend to an existing value
    Prepend(StoreArgs),

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Increment a counter
    Incr {
        key: String,

        #[arg(default_value_t = DEFAULT_COUNTER_DELTA)]
        amount: u64,
    },

    /// Decrement a counter
    Decr {
        key: String,

        #[arg(default_value_t = DEFAULT_COUNTER_DELTA)]
        amount: u64,
    },

    /// Show server statistics
    Stats {
        /// Only show this statistic
        name: Option<String>,
    },

    /// Invalidate all items
    Flush {
        /// Seconds before flushing
        #[arg(short, long, default_value = "0")]
        delay: u32,
    },
}

#[derive(clap::Args, Debug)]
struct StoreArgs {
    /// The key to store
    key: String,

    /// The value to store
    value: String,

    /// Time-to-live in seconds (0 = never expires)
    #[arg(long, default_value = "0")]
    ttl: u32,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,memline=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .connect_timeout_ms(args.timeout_ms)
        .build();

    let mut session = match Session::connect_with(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", config.addr(), e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&mut session, args.command);
    let _ = session.quit();

    match outcome {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command and render its result
fn run(session: &mut Session, command: Commands) -> memline::Result<String> {
    let output = match command {
        Commands::Get { key } => match session.get(&key)? {
            Some(data) => String::from_utf8_lossy(&data).into_owned(),
            None => "(not found)".to_string(),
        },
        Commands::Set(a) => stored(session.store(StoreOp::Set, &a.key, &a.value, a.ttl)?),
        Commands::Add(a) => stored(session.store(StoreOp::Add, &a.key, &a.value, a.ttl)?),
        Commands::Replace(a) => {
            stored(session.store(StoreOp::Replace, &a.key, &a.value, a.ttl)?)
        }
        Commands::Append(a) => stored(session.store(StoreOp::Append, &a.key, &a.value, a.ttl)?),
        Commands::Prepend(a) => {
            stored(session.store(StoreOp::Prepend, &a.key, &a.value, a.ttl)?)
        }
        Commands::Delete { key } => {
            (if session.delete(&key)? { "DELETED" } else { "NOT_FOUND" }).to_string()
        }
        Commands::Incr { key, amount } => counter(session.incr(&key, amount)?),
        Commands::Decr { key, amount } => counter(session.decr(&key, amount)?),
        Commands::Stats { name: Some(name) } => match session.stat(&name)? {
            Some(value) => value,
            None => "(not found)".to_string(),
        },
        Commands::Stats { name: None } => {
            let mut entries: Vec<_> = session.stats()?.into_iter().collect();
            entries.sort();
            entries
                .into_iter()
                .map(|(name, value)| format!("{} {}", name, value))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Commands::Flush { delay } => {
            (if session.flush_all(delay)? { "OK" } else { "NOT_OK" }).to_string()
        }
    };

    Ok(output)
}

fn stored(ok: bool) -> String {
    (if ok { "STORED" } else { "NOT_STORED" }).to_string()
}

fn counter(value: Option<u64>) -> String {
    value.map_or_else(|| "NOT_FOUND".to_string(), |v| v.to_string())
}
