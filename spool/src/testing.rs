use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use spool_db::{Backend, Batch, MemoryBackend};

use crate::config::Config;
use crate::db::Db;

/// In-memory store whose reads, scans and writes can be made to fail.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    pub inner: MemoryBackend,
    pub fail_reads: AtomicBool,
    pub fail_scans: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Default::default()
    }

    fn check(flag: &AtomicBool, what: &str) -> spool_db::Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(spool_db::Error::aborted(format!("injected {} failure", what)))
        } else {
            Ok(())
        }
    }
}

impl Backend for FaultyBackend {
    fn get(&self, key: &[u8]) -> spool_db::Result<Option<Vec<u8>>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(key)
    }

    fn for_each(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> spool_db::Result<()>,
    ) -> spool_db::Result<()> {
        Self::check(&self.fail_scans, "scan")?;
        self.inner.for_each(prefix, visit)
    }

    fn batch(
        &self,
        sync: bool,
        build: &mut dyn FnMut(&mut dyn Batch) -> spool_db::Result<()>,
    ) -> spool_db::Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.batch(sync, build)
    }
}

#[derive(Default)]
pub struct TestHarness {
    // Dropped before the directory is removed
    db: Option<Db>,
    db_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn db_dir(&mut self) -> &std::path::Path {
        if self.db_dir.is_some() {
            return self.db_dir.as_ref().map(|d| d.path()).unwrap();
        }

        // Create temp dir
        let system_temp_dir = std::env::temp_dir();
        let root = PathBuf::from(system_temp_dir).join("spool");
        match std::fs::create_dir(&root) {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {},
            _ => panic!(),
        }

        self.db_dir = Some(tempfile::tempdir_in(&root).unwrap());
        self.db_dir.as_ref().map(|d| d.path()).unwrap()
    }

    pub fn config(&mut self) -> Config {
        let mut config = Config::new(self.db_dir());
        config.sync = false;
        config
    }

    pub fn db(&mut self) -> &Db {
        if self.db.is_some() {
            return self.db.as_ref().unwrap();
        }

        let config = self.config();
        self.db = Some(Db::open_with(&config).unwrap());
        self.db.as_ref().unwrap()
    }

    /// Closes the store and opens it again from disk.
    pub fn reopen(&mut self) -> &Db {
        if let Some(db) = self.db.take() {
            db.close();
        }
        self.db()
    }
}
