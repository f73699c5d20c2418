use tracing::{debug, warn};

use crate::error::Result;
use crate::key::Id;
use crate::queue::{Item, Queue, Timeout};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Open,
    Committed,
    Aborted,
}

/// A group of puts and takes on one queue that succeeds or fails as a unit.
///
/// Staged puts are invisible until `commit`. Taken items are hidden from
/// other takers until the transaction resolves: `commit` deletes them,
/// `abort` makes them available again. Dropping an open transaction aborts
/// it.
#[derive(Debug)]
pub struct Transaction<'q> {
    queue: &'q Queue,
    state: State,
    puts: Vec<Vec<u8>>,
    takes: Vec<Id>,
}

impl<'q> Transaction<'q> {
    pub(crate) fn new(queue: &'q Queue) -> Self {
        Self {
            queue,
            state: State::Open,
            puts: Vec::new(),
            takes: Vec::new(),
        }
    }

    pub fn queue(&self) -> &'q Queue {
        self.queue
    }

    pub fn pending_puts(&self) -> usize {
        self.puts.len()
    }

    /// Ids taken so far, in the order they were taken.
    pub fn pending_takes(&self) -> &[Id] {
        &self.takes
    }

    pub fn put(&mut self, item: impl AsRef<[u8]>) {
        self.puts.push(item.as_ref().to_vec());
    }

    /// Takes up to `n` items, waiting as `Queue::take` does. The items stay
    /// in the store until commit.
    pub fn take(&mut self, n: usize, timeout: impl Into<Timeout>) -> Result<Vec<Item>> {
        let items = self.queue.take_pending(n, timeout.into())?;
        self.takes.extend(items.iter().map(Item::id));
        Ok(items)
    }

    /// Writes staged puts and deletes taken items in one atomic batch.
    ///
    /// If the write fails the taken items are not returned to the queue;
    /// they become available again when the queue is next opened.
    pub fn commit(mut self) -> Result<()> {
        self.state = State::Committed;
        let puts = std::mem::take(&mut self.puts);
        let takes = std::mem::take(&mut self.takes);
        if puts.is_empty() && takes.is_empty() {
            return Ok(());
        }

        match self.queue.append(puts.iter().map(Vec::as_slice), &takes) {
            Ok(ids) => {
                debug!(
                    namespace = self.queue.name(),
                    put = ids.end - ids.start,
                    taken = takes.len(),
                    "committed transaction"
                );
                Ok(())
            },
            Err(e) => {
                warn!(
                    namespace = self.queue.name(),
                    lost = takes.len(),
                    "commit failed: {}",
                    e
                );
                Err(e)
            },
        }
    }

    /// Discards staged puts and returns taken items to the queue.
    pub fn abort(mut self) {
        self.rollback();
        self.state = State::Aborted;
    }

    fn rollback(&mut self) {
        self.puts.clear();
        if !self.takes.is_empty() {
            debug!(
                namespace = self.queue.name(),
                returned = self.takes.len(),
                "aborted transaction"
            );
            self.queue.release(self.takes.drain(..));
        }
    }
}

impl<'q> Drop for Transaction<'q> {
    fn drop(&mut self) {
        if self.state == State::Open {
            self.rollback();
        }
    }
}
