use std::error::Error as StdError;
use std::result::Result as StdResult;

use crate::key::Id;

/// General-purpose error type
#[derive(Debug)]
pub enum Error {
    /// The value for an id taken off the heap is missing from the store.
    NotFound { id: Id },
    /// A key inside a namespace does not hold a valid id. The store is
    /// corrupt.
    Decode { key: Vec<u8> },
    InvalidNamespace { len: usize },
    Config(Box<dyn StdError + Send + Sync + 'static>),
    Storage(spool_db::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    NotFound,
    Decode,
    InvalidNamespace,
    Config,
    Storage,
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::InvalidNamespace { .. } => ErrorKind::InvalidNamespace,
            Self::Config(_) => ErrorKind::Config,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "no value stored for item {}", id),
            Self::Decode { key } => write!(f, "corrupt key in store: {:x?}", key),
            Self::InvalidNamespace { len } => {
                write!(f, "namespace name too long ({} bytes, max {})", len, u16::MAX)
            },
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Config(e) => Some(&**e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<spool_db::Error> for Error {
    fn from(value: spool_db::Error) -> Self {
        Self::Storage(value)
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(Box::new(value))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Config(Box::new(value))
    }
}
