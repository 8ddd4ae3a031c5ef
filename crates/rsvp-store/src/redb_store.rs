use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use redb::{Database, DatabaseError, ReadableTable, Table, TableDefinition, WriteTransaction};
use rsvp_types::{InviteMap, InviteRecord};
use tracing::{debug, warn};

use crate::codec::RecordCodec;
use crate::error::{StoreError, StoreOpenError, StoreResult, ValidationError};
use crate::traits::{validate_replacement, InviteStore};

/// The single logical partition: invite id → encoded record.
pub const INVITES: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("invites");

/// Interval between attempts to take a file lock held by another process.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Options for opening a [`RedbInviteStore`].
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// How long to wait for another process to release the file lock.
    pub lock_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(1),
        }
    }
}

/// File-backed invite store on one redb table.
///
/// redb allows one write transaction at a time and gives read transactions
/// an MVCC snapshot, so every write-path method here is serialized against
/// every other write-path method, and `get_all_invites` always sees one
/// committed state. Tracked reads go through the write path.
///
/// The database handle lives behind an `RwLock<Option<_>>`: operations
/// share the read side, `close` takes the write side and drops the handle,
/// which releases the file lock.
pub struct RedbInviteStore {
    path: PathBuf,
    db: RwLock<Option<Database>>,
}

impl RedbInviteStore {
    /// Open (or create) the store at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreOpenError> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open (or create) the store at `path`.
    ///
    /// Creates the invites table if it does not exist yet. Fails if the
    /// path is unusable or the file stays locked past `lock_timeout`.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreOpenError> {
        let path = path.as_ref();
        let db = acquire(path, options.lock_timeout)?;

        let txn = db
            .begin_write()
            .map_err(|e| StoreOpenError::Init(e.into()))?;
        txn.open_table(INVITES)
            .map_err(|e| StoreOpenError::Init(e.into()))?;
        txn.commit().map_err(|e| StoreOpenError::Init(e.into()))?;

        debug!(path = %path.display(), "invite store opened");
        Ok(Self {
            path: path.to_path_buf(),
            db: RwLock::new(Some(db)),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        f(db)
    }
}

impl InviteStore for RedbInviteStore {
    fn get_invite(&self, id: &str) -> StoreResult<Option<InviteRecord>> {
        self.with_db(|db| {
            write_txn(db, |txn| {
                let mut table = txn.open_table(INVITES)?;
                let Some(mut record) = load(&table, id)? else {
                    return Ok(None);
                };
                record.record_view(Utc::now());
                put(&mut table, id, &record)?;
                Ok(Some(record))
            })
        })
    }

    fn update_invite(
        &self,
        id: &str,
        accepted: bool,
        additional: Vec<String>,
    ) -> StoreResult<Option<InviteRecord>> {
        self.with_db(|db| {
            write_txn(db, |txn| {
                let mut table = txn.open_table(INVITES)?;
                let Some(mut record) = load(&table, id)? else {
                    return Ok(None);
                };
                if !accepted {
                    return Err(ValidationError::NotAccepted.into());
                }
                record
                    .accept(additional, Utc::now())
                    .map_err(ValidationError::from)?;
                put(&mut table, id, &record)?;
                Ok(Some(record))
            })
        })
    }

    fn seed(&self, invites: &InviteMap) -> StoreResult<()> {
        self.with_db(|db| {
            write_txn(db, |txn| {
                let mut table = txn.open_table(INVITES)?;
                for (id, record) in invites {
                    if table.get(id.as_str())?.is_some() {
                        debug!(invite_id = %id, "seed: invite already exists, skipping");
                        continue;
                    }
                    put(&mut table, id, record)?;
                    debug!(invite_id = %id, "seeded invite");
                }
                Ok(Some(()))
            })
        })?;
        Ok(())
    }

    fn get_all_invites(&self) -> StoreResult<InviteMap> {
        self.with_db(|db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(INVITES)?;
            let mut invites = InviteMap::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let id = key.value().to_string();
                let record = RecordCodec::decode(value.value()).map_err(|source| {
                    StoreError::Corrupt {
                        id: id.clone(),
                        source,
                    }
                })?;
                invites.insert(id, record);
            }
            Ok(invites)
        })
    }

    fn replace_all_invites(&self, invites: &InviteMap) -> StoreResult<()> {
        validate_replacement(invites)?;
        self.with_db(|db| {
            write_txn(db, |txn| {
                txn.delete_table(INVITES)?;
                let mut table = txn.open_table(INVITES)?;
                for (id, record) in invites {
                    put(&mut table, id, record)?;
                }
                Ok(Some(()))
            })
        })?;
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        let db = guard.take().ok_or(StoreError::Closed)?;
        drop(db);
        debug!(path = %self.path.display(), "invite store closed");
        Ok(())
    }
}

impl std::fmt::Debug for RedbInviteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self
            .db
            .read()
            .map(|g| g.is_some())
            .unwrap_or(false);
        f.debug_struct("RedbInviteStore")
            .field("path", &self.path)
            .field("open", &open)
            .finish()
    }
}

/// Open the database, polling while another process holds the file lock.
fn acquire(path: &Path, timeout: Duration) -> Result<Database, StoreOpenError> {
    let deadline = Instant::now() + timeout;
    loop {
        match Database::create(path) {
            Ok(db) => return Ok(db),
            Err(DatabaseError::DatabaseAlreadyOpen) => {
                if Instant::now() >= deadline {
                    return Err(StoreOpenError::LockTimeout {
                        path: path.to_path_buf(),
                        timeout,
                    });
                }
                thread::sleep(LOCK_RETRY_INTERVAL);
            }
            Err(source) => {
                return Err(StoreOpenError::Open {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

/// Run `body` in one write transaction.
///
/// `Ok(Some(_))` commits; `Ok(None)` and `Err(_)` abort, so a not-found
/// lookup or a rejected update leaves no trace.
fn write_txn<T>(
    db: &Database,
    body: impl FnOnce(&WriteTransaction) -> StoreResult<Option<T>>,
) -> StoreResult<Option<T>> {
    let txn = db.begin_write()?;
    match body(&txn) {
        Ok(Some(value)) => {
            txn.commit()?;
            Ok(Some(value))
        }
        Ok(None) => {
            txn.abort()?;
            Ok(None)
        }
        Err(err) => {
            if let Err(abort) = txn.abort() {
                warn!(error = %abort, "aborting invite transaction failed");
            }
            Err(err)
        }
    }
}

fn load(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    id: &str,
) -> StoreResult<Option<InviteRecord>> {
    let Some(guard) = table.get(id)? else {
        return Ok(None);
    };
    RecordCodec::decode(guard.value())
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            id: id.to_string(),
            source,
        })
}

fn put(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    id: &str,
    record: &InviteRecord,
) -> StoreResult<()> {
    let bytes = RecordCodec::encode(record).map_err(|source| StoreError::Encode {
        id: id.to_string(),
        source,
    })?;
    table.insert(id, bytes.as_slice())?;
    Ok(())
}
