use std::ops::Range;

use crate::key::Id;

/// Id counter of one namespace.
///
/// Nothing is persisted: on open the counter resumes after the highest id
/// still present in the store. Callers hold the owning queue's sequence lock
/// across reserve, write and advance so that ids are never handed out twice
/// and a failed write leaves no gap.
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    last: Id,
}

impl Sequence {
    pub(crate) fn starting_after(last: Id) -> Self {
        Self { last }
    }

    /// The most recently allocated id, or 0 if none.
    pub(crate) fn last(&self) -> Id {
        self.last
    }

    /// Ids for the next `n` items. The counter does not move until
    /// `advance_to` is called.
    pub(crate) fn reserve(&self, n: usize) -> Range<Id> {
        let start = self.last + 1;
        start..start + n as Id
    }

    pub(crate) fn advance_to(&mut self, reserved: Range<Id>) {
        if reserved.end > self.last + 1 {
            self.last = reserved.end - 1;
        }
    }
}
