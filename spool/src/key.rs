//! Store key layout.
//!
//! Every item lives under `u16be(len(name)) || name || u64be(id)`. The length
//! prefix keeps namespace prefixes prefix-free: "a" and "ab" encode to
//! `00 01 61` and `00 02 61 62`, so a scan of one never reaches the other.

use spool_db::key::{BigEndianU16, BigEndianU64};
use spool_db::prefix::IsPrefixOf;

use crate::error::{Error, Result};

/// Sequence number of an item within its namespace.
pub type Id = u64;

pub const ID_WIDTH: usize = BigEndianU64::WIDTH;

pub fn encode_id(id: Id) -> [u8; ID_WIDTH] {
    BigEndianU64::from(id).into()
}

pub fn decode_id(bytes: &[u8]) -> Result<Id> {
    BigEndianU64::try_from(bytes)
        .map(u64::from)
        .map_err(|_| Error::Decode {
            key: bytes.to_vec(),
        })
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Namespace {
    name: String,
    prefix: Vec<u8>,
}

impl Namespace {
    pub fn new(name: &str) -> Result<Self> {
        let len = u16::try_from(name.len()).map_err(|_| Error::InvalidNamespace {
            len: name.len(),
        })?;
        let prefix = [BigEndianU16::from(len).as_ref(), name.as_bytes()].concat();
        Ok(Self {
            name: name.to_owned(),
            prefix,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn key(&self, id: Id) -> Vec<u8> {
        [&self.prefix[..], &encode_id(id)[..]].concat()
    }

    /// Strips the namespace prefix. `None` means the key belongs elsewhere.
    pub fn split<'k>(&self, key: &'k [u8]) -> Option<&'k [u8]> {
        if self.prefix.is_prefix_of(key) {
            Some(&key[self.prefix.len()..])
        } else {
            None
        }
    }

    /// Decodes the id of a key. Keys outside the namespace yield `Ok(None)`;
    /// keys inside it that do not end in a valid id are corrupt.
    pub fn decode(&self, key: &[u8]) -> Result<Option<Id>> {
        match self.split(key) {
            Some(rest) => match decode_id(rest) {
                Ok(id) => Ok(Some(id)),
                Err(_) => Err(Error::Decode { key: key.to_vec() }),
            },
            None => Ok(None),
        }
    }
}
