use std::path::PathBuf;

use tempfile::TempDir;

use crate::db::{DbOptions, RocksBackend};

#[derive(Default)]
pub struct TestDb {
    // Dropped before the directory is removed
    db: Option<RocksBackend>,
    db_dir: Option<TempDir>,
}

impl TestDb {
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

    pub fn db(&mut self) -> &RocksBackend {
        if self.db.is_some() {
            return self.db.as_ref().unwrap();
        }

        let db_dir = self.db_dir().to_owned();
        let mut options = DbOptions::default();
        options.create_if_missing = true;
        self.db = Some(RocksBackend::open(&db_dir, &options).unwrap());

        self.db.as_ref().unwrap()
    }

    /// Closes the current handle and opens the same directory again.
    pub fn reopen(&mut self) -> &RocksBackend {
        self.db = None;
        self.db()
    }
}
