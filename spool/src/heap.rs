use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::key::Id;

/// Min-heap of ids waiting to be taken. Ids are handed out in increasing
/// order, so popping the minimum yields insertion order.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdHeap {
    ids: BinaryHeap<Reverse<Id>>,
}

impl IdHeap {
    pub(crate) fn push(&mut self, id: Id) {
        self.ids.push(Reverse(id));
    }

    pub(crate) fn pop(&mut self) -> Option<Id> {
        self.ids.pop().map(|Reverse(id)| id)
    }

    pub(crate) fn peek(&self) -> Option<Id> {
        self.ids.peek().map(|&Reverse(id)| id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes every id, smallest first.
    pub(crate) fn drain(&mut self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.ids.drain().map(|Reverse(id)| id).collect();
        ids.sort_unstable();
        ids
    }
}

impl Extend<Id> for IdHeap {
    fn extend<T: IntoIterator<Item = Id>>(&mut self, iter: T) {
        for id in iter {
            self.push(id);
        }
    }
}

impl FromIterator<Id> for IdHeap {
    fn from_iter<T: IntoIterator<Item = Id>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().map(Reverse).collect(),
        }
    }
}
