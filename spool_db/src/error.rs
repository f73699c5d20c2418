use std::error::Error as StdError;

#[derive(Debug)]
pub enum Error {
    /// A batch builder or scan visitor gave up; nothing was written.
    Aborted(String),
    Raw(rocksdb::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    Aborted,
    StorageError,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Aborted(_) => ErrorKind::Aborted,
            Self::Raw(_) => ErrorKind::StorageError,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted(reason) => write!(f, "operation aborted: {}", reason),
            Self::Raw(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Aborted(_) => None,
            Self::Raw(e) => Some(e),
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(value: rocksdb::Error) -> Self {
        Self::Raw(value)
    }
}
