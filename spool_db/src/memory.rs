use std::collections::BTreeMap;
use std::ops::Bound;

use byteview::ByteView;
use log::trace;
use parking_lot::RwLock;

use crate::backend::{Backend, Batch};
use crate::error::Result;
use crate::prefix::IsPrefixOf;

/// Non-persistent store over an ordered map. Writes are applied under a
/// single write lock, so every batch is atomic; `sync` has no effect.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<Vec<u8>, ByteView>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

enum Op {
    Put(Vec<u8>, ByteView),
    Delete(Vec<u8>),
}

#[derive(Default)]
struct MemoryBatch {
    ops: Vec<Op>,
}

impl Batch for MemoryBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(Op::Put(key.to_vec(), value.into()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.ops.push(Op::Delete(key.to_vec()));
    }

    fn reset(&mut self) {
        self.ops.clear();
    }

    fn len(&self) -> usize {
        self.ops.len()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).map(|v| v.to_vec()))
    }

    fn for_each(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>,
    ) -> Result<()> {
        // Snapshot the range so that `visit` may write to the store
        let snapshot: Vec<(Vec<u8>, ByteView)> = {
            let entries = self.entries.read();
            entries
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(k, _)| prefix.is_prefix_of(&k[..]))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        for (key, value) in snapshot.iter() {
            visit(&key[..], &value[..])?;
        }
        Ok(())
    }

    fn batch(&self, _sync: bool, build: &mut dyn FnMut(&mut dyn Batch) -> Result<()>) -> Result<()> {
        let mut batch = MemoryBatch::default();
        build(&mut batch)?;
        trace!("applying batch of {} operations", batch.len());
        let mut entries = self.entries.write();
        for op in batch.ops {
            match op {
                Op::Put(key, value) => {
                    entries.insert(key, value);
                },
                Op::Delete(key) => {
                    entries.remove(&key);
                },
            }
        }
        Ok(())
    }
}
