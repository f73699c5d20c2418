//! Durable FIFO queues stored in an embedded key-value store.
//!
//! A [`Db`] holds any number of named queues. Items put into a queue are
//! written to the store before they become visible, and are removed from the
//! store when taken. Puts and takes can be grouped into a [`Transaction`].
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let db = spool::Db::open("/tmp/spool-demo")?;
//! let jobs = db.bucket("jobs")?;
//! jobs.put(b"resize image 17")?;
//!
//! let mut txn = jobs.transaction();
//! for item in txn.take(10, Duration::from_secs(1))? {
//!     println!("{}", String::from_utf8_lossy(item.value()));
//! }
//! txn.commit()?;
//! # Ok::<(), spool::Error>(())
//! ```

pub mod config;
pub mod db;
pub mod error;
mod heap;
pub mod key;
pub mod queue;
mod sequence;
#[cfg(test)]
mod testing;
pub mod transaction;

pub use db::Db;
pub use error::{Error, ErrorKind, Result};
pub use key::Id;
pub use queue::{Item, Queue, Timeout};
pub use spool_db::{Backend, Batch};
pub use transaction::Transaction;

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
/// Log records from the storage layer are forwarded to it.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
