use crate::error::Result;
use crate::prefix::IsPrefixOf;
use crate::RawDb;

/// Trait for implementing iterators and wrappers around the base DB cursor.
pub trait Cursor: Sized {
    /// `Ok(None)` once the cursor is exhausted.
    fn check_status(&mut self) -> Result<Option<()>>;

    fn next(&mut self);

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    fn prefix(self, prefix: Vec<u8>) -> Prefix<Self> {
        Prefix {
            prefix,
            cursor: self,
            done: false,
        }
    }

    fn iter(self) -> Iter<Self> {
        Iter {
            cursor: self,
            done: false,
        }
    }
}

pub struct BaseCursor<'db> {
    raw: rocksdb::DBRawIteratorWithThreadMode<'db, RawDb>,
}

impl<'db> BaseCursor<'db> {
    pub(crate) fn new(raw: rocksdb::DBRawIteratorWithThreadMode<'db, RawDb>) -> Self {
        Self { raw }
    }

    pub fn seek_to_first(&mut self) {
        self.raw.seek_to_first();
    }

    pub fn seek(&mut self, key: &[u8]) {
        self.raw.seek(key);
    }

    pub fn prefix_iter(mut self, prefix: &[u8]) -> Prefix<Self> {
        self.seek(prefix);
        self.prefix(prefix.to_vec())
    }
}

impl<'db> Cursor for BaseCursor<'db> {
    fn check_status(&mut self) -> Result<Option<()>> {
        if self.raw.valid() {
            Ok(Some(()))
        } else {
            match self.raw.status() {
                Ok(_) => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn next(&mut self) {
        self.raw.next();
    }

    // Only called after check_status reported a valid position.
    fn key(&self) -> &[u8] {
        self.raw.key().unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.raw.value().unwrap_or_default()
    }
}

/// A cursor which iterates over keys that match a particular prefix.
pub struct Prefix<C: Cursor> {
    cursor: C,
    prefix: Vec<u8>,
    done: bool,
}

impl<C: Cursor> Cursor for Prefix<C> {
    fn check_status(&mut self) -> Result<Option<()>> {
        if self.done {
            return Ok(None);
        }
        match self.cursor.check_status()? {
            Some(()) => {
                if !self.prefix.is_prefix_of(self.key()) {
                    self.done = true;
                    Ok(None)
                } else {
                    Ok(Some(()))
                }
            },
            None => Ok(None),
        }
    }

    fn next(&mut self) {
        self.cursor.next();
    }

    fn key(&self) -> &[u8] {
        self.cursor.key()
    }

    fn value(&self) -> &[u8] {
        self.cursor.value()
    }
}

/// Yields entries until the cursor is exhausted or reports an error. An
/// error is yielded once and ends the iteration.
pub struct Iter<C: Cursor> {
    cursor: C,
    done: bool,
}

impl<C: Cursor> Iterator for Iter<C> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.check_status() {
            Ok(Some(())) => {
                let entry = (self.cursor.key().to_vec(), self.cursor.value().to_vec());
                self.cursor.next();
                Some(Ok(entry))
            },
            Ok(None) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}
