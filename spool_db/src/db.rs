use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::backend::{Backend, Batch};
use crate::cursor::{BaseCursor, Cursor};
use crate::error::Result;
use crate::RawDb;

#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct DbOptions {
    pub create_if_missing: bool,
    pub paranoid_checks: bool,
}

impl<'a> From<&'a DbOptions> for rocksdb::Options {
    fn from(value: &'a DbOptions) -> Self {
        let mut options = rocksdb::Options::default();
        options.create_if_missing(value.create_if_missing);
        options.set_paranoid_checks(value.paranoid_checks);
        options
    }
}

/// RocksDB-backed store.
pub struct RocksBackend {
    pub(crate) raw: RawDb,
}

impl RocksBackend {
    pub fn open(dir: &Path, options: &DbOptions) -> Result<Self> {
        let raw = RawDb::open(&options.into(), dir)?;
        info!("opened store at {}", dir.display());
        Ok(Self { raw })
    }

    /// Removes all on-disk state at `dir`. The store must not be open.
    pub fn destroy(dir: &Path) -> Result<()> {
        RawDb::destroy(&rocksdb::Options::default(), dir)?;
        info!("destroyed store at {}", dir.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.raw.path()
    }

    pub fn cursor(&self) -> BaseCursor<'_> {
        BaseCursor::new(self.raw.raw_iterator())
    }
}

impl std::fmt::Debug for RocksBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksBackend")
            .field("path", &PathBuf::from(self.path()))
            .finish()
    }
}

struct RocksBatch {
    inner: rocksdb::WriteBatch,
}

impl Batch for RocksBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.inner.put(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.delete(key);
    }

    fn reset(&mut self) {
        self.inner.clear();
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Backend for RocksBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.raw.get(key)?)
    }

    fn for_each(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>,
    ) -> Result<()> {
        let mut cursor = self.cursor().prefix_iter(prefix);
        while cursor.check_status()?.is_some() {
            visit(cursor.key(), cursor.value())?;
            cursor.next();
        }
        Ok(())
    }

    fn batch(&self, sync: bool, build: &mut dyn FnMut(&mut dyn Batch) -> Result<()>) -> Result<()> {
        let mut batch = RocksBatch {
            inner: rocksdb::WriteBatch::default(),
        };
        build(&mut batch)?;
        if batch.is_empty() {
            return Ok(());
        }
        debug!("writing batch of {} operations (sync: {})", batch.len(), sync);
        let mut options = rocksdb::WriteOptions::default();
        options.set_sync(sync);
        Ok(self.raw.write_opt(batch.inner, &options)?)
    }
}
