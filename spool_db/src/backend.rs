use crate::error::Result;

/// Staged writes of a single atomic batch.
pub trait Batch {
    fn put(&mut self, key: &[u8], value: &[u8]);

    fn delete(&mut self, key: &[u8]);

    /// Drops every staged operation.
    fn reset(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered byte-key/byte-value store.
///
/// Keys are iterated in ascending bytewise order. When `sync` is set, a write
/// does not return until it has been flushed to durable media.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Returns `None` if the key is absent. Errors are reserved for storage
    /// failures.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Visits every key starting with `prefix` in ascending order. Iteration
    /// stops at the first error returned by `visit`, which is passed through.
    fn for_each(
        &self,
        prefix: &[u8],
        visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>,
    ) -> Result<()>;

    /// Builds a batch with `build` and writes it atomically. If `build` fails
    /// the batch is discarded and the error returned.
    fn batch(&self, sync: bool, build: &mut dyn FnMut(&mut dyn Batch) -> Result<()>) -> Result<()>;

    /// Deletes every key under `prefix` in one batch.
    fn clear(&self, prefix: &[u8], sync: bool) -> Result<()> {
        let mut keys = Vec::new();
        self.for_each(prefix, &mut |key, _| {
            keys.push(key.to_vec());
            Ok(())
        })?;
        if keys.is_empty() {
            return Ok(());
        }
        log::debug!("clearing {} keys", keys.len());
        self.batch(sync, &mut |batch| {
            for key in keys.iter() {
                batch.delete(key);
            }
            Ok(())
        })
    }
}
