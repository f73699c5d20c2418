use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use spool_db::Backend;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::heap::IdHeap;
use crate::key::{Id, Namespace};
use crate::sequence::Sequence;
use crate::transaction::Transaction;

/// How long a take may block waiting for items.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timeout {
    /// Return whatever is available right now.
    NoWait,
    After(Duration),
    Never,
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        if value.is_zero() {
            Self::NoWait
        } else {
            Self::After(value)
        }
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(value: Option<Duration>) -> Self {
        match value {
            Some(duration) => duration.into(),
            None => Self::Never,
        }
    }
}

/// An item removed from a queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    id: Id,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Item {
    pub fn id(&self) -> Id {
        self.id
    }

    /// Full store key, namespace prefix included.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

/// A FIFO queue over one namespace of the store.
///
/// The heap holds the ids that can be taken. It is guarded by `pending`, and
/// `available` is signalled after every push, so a waiter that wakes up with
/// the lock held sees a non-empty heap unless another waiter beat it to the
/// item. Lock order is `sequence` before `pending`.
pub struct Queue {
    namespace: Namespace,
    backend: Arc<dyn Backend>,
    pending: Mutex<IdHeap>,
    available: Condvar,
    sequence: Mutex<Sequence>,
    sync: AtomicBool,
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.pending.lock();
        f.debug_struct("Queue")
            .field("namespace", &self.namespace.name())
            .field("pending", &pending.len())
            .field("next", &pending.peek())
            .field("sync", &self.durability())
            .finish()
    }
}

impl Queue {
    /// Opens the queue for `namespace`, loading every item already in the
    /// store. Fails without a partial queue if any key cannot be decoded.
    pub(crate) fn open(namespace: Namespace, backend: Arc<dyn Backend>, sync: bool) -> Result<Self> {
        let mut ids = Vec::new();
        let mut corrupt = None;
        let mut stopped = false;
        let scanned = backend.for_each(namespace.prefix(), &mut |key, _| match namespace.decode(key) {
            Ok(Some(id)) => {
                ids.push(id);
                Ok(())
            },
            // Past the end of the namespace
            Ok(None) => {
                stopped = true;
                Err(spool_db::Error::aborted("left namespace"))
            },
            Err(e) => {
                corrupt = Some(e);
                Err(spool_db::Error::aborted("corrupt key"))
            },
        });
        if let Some(e) = corrupt {
            return Err(e);
        }
        match scanned {
            Ok(()) => {},
            Err(_) if stopped => {},
            Err(e) => return Err(e.into()),
        }

        let last = ids.iter().copied().max().unwrap_or(0);
        debug!(
            namespace = namespace.name(),
            recovered = ids.len(),
            last_id = last,
            "opened queue"
        );

        Ok(Self {
            namespace,
            backend,
            pending: Mutex::new(ids.into_iter().collect()),
            available: Condvar::new(),
            sequence: Mutex::new(Sequence::starting_after(last)),
            sync: AtomicBool::new(sync),
        })
    }

    pub fn name(&self) -> &str {
        self.namespace.name()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Whether writes are flushed to disk before returning.
    pub fn durability(&self) -> bool {
        self.sync.load(Ordering::Relaxed)
    }

    pub fn set_durability(&self, sync: bool) {
        self.sync.store(sync, Ordering::Relaxed);
    }

    /// Number of items that can be taken right now.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// The highest id handed out so far, or 0.
    pub fn last_id(&self) -> Id {
        self.sequence.lock().last()
    }

    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    pub fn put(&self, item: impl AsRef<[u8]>) -> Result<Id> {
        let ids = self.put_all([item])?;
        Ok(ids.start)
    }

    /// Appends items in one atomic write and returns their ids.
    pub fn put_all<T: AsRef<[u8]>>(&self, items: impl IntoIterator<Item = T>) -> Result<Range<Id>> {
        let items: Vec<T> = items.into_iter().collect();
        self.append(items.iter().map(|item| <T as AsRef<[u8]>>::as_ref(item)), &[])
    }

    /// Takes up to `n` items and deletes them from the store.
    ///
    /// Blocks until `n` items have been collected or `timeout` has passed.
    /// Running out of time is not an error; the items collected so far are
    /// returned.
    ///
    /// If the delete fails nothing has been handed out, so the items are
    /// made available again before the error is returned.
    pub fn take(&self, n: usize, timeout: impl Into<Timeout>) -> Result<Vec<Item>> {
        let mut txn = self.transaction();
        let items = txn.take(n, timeout)?;
        let ids = txn.pending_takes().to_vec();
        if let Err(e) = txn.commit() {
            self.release(ids);
            return Err(e);
        }
        Ok(items)
    }

    /// Deletes every item in the namespace. No transaction may be open on
    /// this queue.
    pub fn clear(&self) -> Result<()> {
        // Holding the sequence lock keeps puts out until the heap is drained
        let _sequence = self.sequence.lock();
        let mut pending = self.pending.lock();
        self.backend.clear(self.namespace.prefix(), self.durability())?;
        let dropped = pending.drain();
        debug!(namespace = self.name(), dropped = dropped.len(), "cleared queue");
        Ok(())
    }

    /// Writes `puts` under fresh ids and deletes `deletes` in a single batch,
    /// then makes the new ids available.
    pub(crate) fn append<'a>(
        &self,
        puts: impl ExactSizeIterator<Item = &'a [u8]> + Clone,
        deletes: &[Id],
    ) -> Result<Range<Id>> {
        let mut sequence = self.sequence.lock();
        let ids = sequence.reserve(puts.len());
        self.backend.batch(self.durability(), &mut |batch| {
            for (id, value) in ids.clone().zip(puts.clone()) {
                batch.put(&self.namespace.key(id), value);
            }
            for &id in deletes {
                batch.delete(&self.namespace.key(id));
            }
            Ok(())
        })?;
        self.release(ids.clone());
        sequence.advance_to(ids.clone());
        Ok(ids)
    }

    /// Makes ids available for taking and wakes waiters.
    pub(crate) fn release(&self, ids: impl IntoIterator<Item = Id>) {
        let mut pending = self.pending.lock();
        let before = pending.len();
        pending.extend(ids);
        match pending.len() - before {
            0 => {},
            1 => {
                self.available.notify_one();
            },
            _ => {
                self.available.notify_all();
            },
        }
    }

    /// Pops up to `n` ids and reads their values. The ids stay in the store
    /// and are hidden from other takers until the caller deletes them or
    /// hands them back with `release`.
    pub(crate) fn take_pending(&self, n: usize, timeout: Timeout) -> Result<Vec<Item>> {
        let ids = self.await_ids(n, timeout);
        match self.fetch(&ids) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(namespace = self.name(), count = ids.len(), "read failed, returning items: {}", e);
                self.release(ids);
                Err(e)
            },
        }
    }

    fn await_ids(&self, n: usize, timeout: Timeout) -> Vec<Id> {
        let mut ids = Vec::new();
        if n == 0 {
            return ids;
        }

        let deadline = match timeout {
            Timeout::After(duration) => Instant::now().checked_add(duration),
            _ => None,
        };

        let mut pending = self.pending.lock();
        loop {
            while ids.len() < n {
                match pending.pop() {
                    Some(id) => ids.push(id),
                    None => break,
                }
            }
            if ids.len() == n {
                break;
            }
            match (timeout, deadline) {
                (Timeout::NoWait, _) => break,
                (Timeout::After(_), Some(deadline)) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    self.available.wait_until(&mut pending, deadline);
                },
                // Deadline too far away to represent
                (Timeout::After(_), None) | (Timeout::Never, _) => {
                    self.available.wait(&mut pending);
                },
            }
        }

        // We may have consumed a wakeup meant for someone else
        if !pending.is_empty() {
            self.available.notify_one();
        }
        ids
    }

    fn fetch(&self, ids: &[Id]) -> Result<Vec<Item>> {
        ids.iter()
            .map(|&id| -> Result<Item> {
                let key = self.namespace.key(id);
                match self.backend.get(&key)? {
                    Some(value) => Ok(Item { id, key, value }),
                    None => Err(Error::NotFound { id }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use spool_db::{Backend, MemoryBackend};

    use super::{Queue, Timeout};
    use crate::error::{Error, ErrorKind};
    use crate::key::Namespace;
    use crate::testing::FaultyBackend;

    fn faulty_queue(name: &str) -> (Arc<FaultyBackend>, Queue) {
        let backend = Arc::new(FaultyBackend::new());
        let queue = Queue::open(Namespace::new(name).unwrap(), backend.clone(), false).unwrap();
        (backend, queue)
    }

    fn queue(name: &str) -> (Arc<MemoryBackend>, Queue) {
        let backend = Arc::new(MemoryBackend::new());
        let queue = Queue::open(Namespace::new(name).unwrap(), backend.clone(), false).unwrap();
        (backend, queue)
    }

    #[test]
    fn test_put_take() {
        let (_, queue) = queue("q");
        let id = queue.put(b"hello").unwrap();
        assert_eq!(id, 1);
        assert_eq!(queue.len(), 1);
        let items = queue.take(1, Timeout::Never).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), 1);
        assert_eq!(items[0].value(), b"hello");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_deletes_from_store() {
        let (backend, queue) = queue("q");
        queue.put(b"x").unwrap();
        let items = queue.take(1, Timeout::NoWait).unwrap();
        assert_eq!(backend.get(items[0].key()).unwrap(), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_put_all_assigns_consecutive_ids() {
        let (_, queue) = queue("q");
        assert_eq!(queue.put_all(["a", "b", "c"]).unwrap(), 1..4);
        assert_eq!(queue.put(b"d").unwrap(), 4);
        assert_eq!(queue.last_id(), 4);
        let values: Vec<_> = queue
            .take(4, Timeout::NoWait)
            .unwrap()
            .into_iter()
            .map(|item| item.into_value())
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn test_take_without_waiting() {
        let (_, queue) = queue("q");
        assert!(queue.take(1, Duration::ZERO).unwrap().is_empty());
        queue.put(b"1").unwrap();
        let items = queue.take(3, Timeout::NoWait).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_take_zero() {
        let (_, queue) = queue("q");
        queue.put(b"1").unwrap();
        assert!(queue.take(0, Timeout::Never).unwrap().is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_timeout_returns_partial() {
        let (_, queue) = queue("q");
        queue.put(b"1").unwrap();
        let start = Instant::now();
        let items = queue.take(2, Duration::from_millis(50)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_waiter_woken_by_put() {
        let (_, queue) = queue("q");
        let queue = Arc::new(queue);
        let taker = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.take(2, Timeout::Never).unwrap()
        });
        thread::sleep(Duration::from_millis(20));
        queue.put(b"first").unwrap();
        thread::sleep(Duration::from_millis(20));
        queue.put(b"second").unwrap();
        let items = taker.join().unwrap();
        let values: Vec<_> = items.iter().map(|item| item.value().to_vec()).collect();
        assert_eq!(values, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn test_each_item_delivered_once() {
        let (_, queue) = queue("q");
        let queue = Arc::new(queue);
        let takers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.take(25, Duration::from_secs(5)).unwrap())
            })
            .collect();
        for i in 0..100u32 {
            queue.put(i.to_be_bytes()).unwrap();
        }
        let mut ids: Vec<_> = takers
            .into_iter()
            .flat_map(|t| t.join().unwrap())
            .map(|item| item.id())
            .collect();
        ids.sort();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn test_recovers_existing_items() {
        let backend = Arc::new(MemoryBackend::new());
        let ns = Namespace::new("q").unwrap();
        {
            let queue = Queue::open(ns.clone(), backend.clone(), false).unwrap();
            queue.put_all(["a", "b", "c"]).unwrap();
            queue.take(1, Timeout::NoWait).unwrap();
        }
        let queue = Queue::open(ns, backend, false).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.last_id(), 3);
        assert_eq!(queue.put(b"d").unwrap(), 4);
    }

    #[test]
    fn test_corrupt_key_aborts_open() {
        let backend = Arc::new(MemoryBackend::new());
        let ns = Namespace::new("q").unwrap();
        backend
            .batch(false, &mut |batch| {
                batch.put(&ns.key(1), b"ok");
                batch.put(&[ns.prefix(), &b"bad"[..]].concat(), b"corrupt");
                Ok(())
            })
            .unwrap();
        let err = Queue::open(ns, backend, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_missing_value_restores_ids() {
        let (backend, queue) = queue("q");
        queue.put_all(["a", "b"]).unwrap();
        let ns = queue.namespace().clone();
        // Remove the value behind the heap's back
        backend
            .batch(false, &mut |batch| {
                batch.delete(&ns.key(2));
                Ok(())
            })
            .unwrap();

        let err = queue.take(2, Timeout::NoWait).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(queue.len(), 2);
        let items = queue.take(1, Timeout::NoWait).unwrap();
        assert_eq!(items[0].value(), b"a");
    }

    #[test]
    fn test_clear() {
        let (backend, queue) = queue("q");
        let (_, other) = queue_on(&backend, "r");
        queue.put_all(["a", "b"]).unwrap();
        other.put(b"keep").unwrap();
        queue.clear().unwrap();
        assert!(queue.is_empty());
        assert!(queue.take(1, Timeout::NoWait).unwrap().is_empty());
        assert_eq!(other.len(), 1);
        assert_eq!(backend.len(), 1);
    }

    fn queue_on(backend: &Arc<MemoryBackend>, name: &str) -> (Arc<MemoryBackend>, Queue) {
        let queue = Queue::open(Namespace::new(name).unwrap(), backend.clone(), false).unwrap();
        (backend.clone(), queue)
    }

    #[test]
    fn test_durability_flag() {
        let (_, queue) = queue("q");
        assert!(!queue.durability());
        queue.set_durability(true);
        assert!(queue.durability());
        queue.put(b"synced").unwrap();
    }

    #[test]
    fn test_failed_delete_restores_items() {
        let (backend, queue) = faulty_queue("q");
        queue.put(b"payload").unwrap();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let err = queue.take(1, Timeout::NoWait).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(queue.len(), 1);
        assert_eq!(backend.inner.len(), 1);

        backend.fail_writes.store(false, Ordering::SeqCst);
        let items = queue.take(1, Timeout::NoWait).unwrap();
        assert_eq!(items[0].value(), b"payload");
        assert!(backend.inner.is_empty());
    }

    #[test]
    fn test_read_error_passed_through() {
        let (backend, queue) = faulty_queue("q");
        queue.put_all(["a", "b"]).unwrap();

        backend.fail_reads.store(true, Ordering::SeqCst);
        match queue.take(2, Timeout::NoWait) {
            Err(Error::Storage(e)) => assert_eq!(e.kind(), spool_db::ErrorKind::Aborted),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(queue.len(), 2);

        backend.fail_reads.store(false, Ordering::SeqCst);
        let ids: Vec<_> = queue.take(2, Timeout::NoWait).unwrap().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_scan_error_aborts_open() {
        let backend = Arc::new(FaultyBackend::new());
        backend.fail_scans.store(true, Ordering::SeqCst);
        let err = Queue::open(Namespace::new("q").unwrap(), backend, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_clear_racing_puts_keeps_heap_and_store_equal() {
        let (backend, queue) = queue("q");
        let queue = Arc::new(queue);
        let producer = thread::spawn({
            let queue = Arc::clone(&queue);
            move || {
                for i in 0..500u32 {
                    queue.put(i.to_be_bytes()).unwrap();
                }
            }
        });
        for _ in 0..50 {
            queue.clear().unwrap();
            thread::yield_now();
        }
        producer.join().unwrap();

        let stored = backend.len();
        assert_eq!(queue.len(), stored);
        // Every id left in the heap still has a value
        let items = queue.take(stored, Timeout::NoWait).unwrap();
        assert_eq!(items.len(), stored);
        assert!(backend.is_empty());
    }
}
