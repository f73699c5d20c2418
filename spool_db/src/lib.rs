pub mod backend;
pub mod cursor;
pub mod db;
pub mod error;
pub mod key;
pub mod memory;
pub mod prefix;
#[cfg(test)]
pub mod testing;

pub use backend::{Backend, Batch};
pub use db::{DbOptions, RocksBackend};
pub use error::{Error, ErrorKind, Result};
pub use memory::MemoryBackend;

type RawDb = rocksdb::DB;
