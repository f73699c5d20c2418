use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use spool_db::{Backend, MemoryBackend, RocksBackend};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::key::Namespace;
use crate::queue::Queue;

/// Handle to a store holding any number of named queues.
///
/// Queues are shared: asking for the same name twice returns the same queue
/// while it is alive. The registry only holds weak references, so a queue is
/// released once its last user drops it.
#[derive(Debug)]
pub struct Db {
    backend: Arc<dyn Backend>,
    path: Option<PathBuf>,
    sync: bool,
    queues: DashMap<String, Weak<Queue>>,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(&Config::new(path))
    }

    pub fn open_with(config: &Config) -> Result<Self> {
        let backend = RocksBackend::open(&config.db_dir, &config.db_options())?;
        Ok(Self {
            backend: Arc::new(backend),
            path: Some(config.db_dir.clone()),
            sync: config.sync,
            queues: Default::default(),
        })
    }

    /// Opens a store that lives only as long as this handle and its queues.
    pub fn open_in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
            path: None,
            sync: false,
            queues: Default::default(),
        }
    }

    /// Deletes the store at `path`. It must not be open.
    pub fn destroy(path: impl AsRef<Path>) -> Result<()> {
        Ok(RocksBackend::destroy(path.as_ref())?)
    }

    /// `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Returns the queue named `name`, loading it from the store if it is not
    /// already open.
    pub fn bucket(&self, name: &str) -> Result<Arc<Queue>> {
        if let Some(queue) = self.queues.get(name).and_then(|entry| entry.upgrade()) {
            return Ok(queue);
        }

        // Recover without holding the shard lock. If another caller got there
        // first, its queue wins and this one is discarded unused.
        let loaded = self.load(name)?;
        let queue = match self.queues.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => match entry.get().upgrade() {
                Some(queue) => queue,
                None => {
                    entry.insert(Arc::downgrade(&loaded));
                    loaded
                },
            },
            Entry::Vacant(entry) => {
                entry.insert(Arc::downgrade(&loaded));
                loaded
            },
        };
        self.queues.retain(|_, queue| queue.strong_count() > 0);
        Ok(queue)
    }

    fn load(&self, name: &str) -> Result<Arc<Queue>> {
        let namespace = Namespace::new(name)?;
        let queue = Queue::open(namespace, Arc::clone(&self.backend), self.sync)?;
        Ok(Arc::new(queue))
    }

    /// Releases the handle. The store stays open until every queue obtained
    /// from it has been dropped too.
    pub fn close(self) {
        let live = self.queues.iter().filter(|entry| entry.value().strong_count() > 0).count();
        if live > 0 {
            debug!(live, "closing store with queues still in use");
        }
        match &self.path {
            Some(path) => info!("closing store at {}", path.display()),
            None => info!("closing in-memory store"),
        }
    }
}
