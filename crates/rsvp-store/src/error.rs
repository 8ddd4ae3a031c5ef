use std::path::PathBuf;
use std::time::Duration;

use rsvp_types::{InviteId, RecordError};

use crate::codec::CodecError;

/// Errors from opening the backing container. Fatal at boot.
#[derive(Debug, thiserror::Error)]
pub enum StoreOpenError {
    /// The path cannot be opened or created as a database.
    #[error("opening invite database at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: redb::DatabaseError,
    },

    /// Another process kept the file locked for longer than the timeout.
    #[error("timed out after {timeout:?} waiting for the lock on {}", .path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// The invites table could not be created.
    #[error("initialising invites table: {0}")]
    Init(#[source] redb::Error),
}

/// Business-rule violations. These are caller-input problems and must never
/// be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("only accepted=true updates are allowed")]
    NotAccepted,

    #[error("too many additional guests: got {got}, max allowed {max}")]
    TooManyGuests { got: usize, max: u32 },

    #[error("invalid invite {id}: {reason}")]
    InvalidRecord { id: InviteId, reason: String },
}

impl From<RecordError> for ValidationError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::TooManyGuests { got, max } => Self::TooManyGuests { got, max },
        }
    }
}

/// Errors from invite store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O, lock or transaction failure in the backing container.
    #[error("storage backend error: {0}")]
    Backend(#[from] redb::Error),

    /// A stored payload could not be decoded (on-disk corruption).
    #[error("corrupt invite {id}: {source}")]
    Corrupt { id: InviteId, source: CodecError },

    /// A record could not be encoded for storage.
    #[error("encoding invite {id}: {source}")]
    Encode { id: InviteId, source: CodecError },

    /// The request broke a business rule. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Returns `true` for caller-input problems (as opposed to internal
    /// failures).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

macro_rules! backend_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    Self::Backend(redb::Error::from(err))
                }
            }
        )+
    };
}

backend_from!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
