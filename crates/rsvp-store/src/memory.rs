use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rsvp_types::{InviteMap, InviteRecord};

use crate::error::{StoreError, StoreResult, ValidationError};
use crate::traits::{validate_replacement, InviteStore};

/// In-memory, `BTreeMap`-based invite store.
///
/// Intended for tests and embedding. A single mutex serializes every
/// operation, which trivially gives the same atomicity as the file-backed
/// store. Nothing survives the process.
pub struct InMemoryInviteStore {
    invites: Mutex<Option<InviteMap>>,
}

impl InMemoryInviteStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            invites: Mutex::new(Some(InviteMap::new())),
        }
    }

    /// Create a store pre-populated with `invites`.
    pub fn with_invites(invites: InviteMap) -> Self {
        Self {
            invites: Mutex::new(Some(invites)),
        }
    }

    /// Number of invites currently stored (zero once closed).
    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, InviteMap::len)
    }

    /// Returns `true` if the store holds no invites.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Option<InviteMap>> {
        self.invites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut InviteMap) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.lock();
        let map = guard.as_mut().ok_or(StoreError::Closed)?;
        f(map)
    }
}

impl Default for InMemoryInviteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InviteStore for InMemoryInviteStore {
    fn get_invite(&self, id: &str) -> StoreResult<Option<InviteRecord>> {
        self.with_map(|map| {
            Ok(map.get_mut(id).map(|record| {
                record.record_view(Utc::now());
                record.clone()
            }))
        })
    }

    fn update_invite(
        &self,
        id: &str,
        accepted: bool,
        additional: Vec<String>,
    ) -> StoreResult<Option<InviteRecord>> {
        self.with_map(|map| {
            let Some(record) = map.get_mut(id) else {
                return Ok(None);
            };
            if !accepted {
                return Err(ValidationError::NotAccepted.into());
            }
            record
                .accept(additional, Utc::now())
                .map_err(ValidationError::from)?;
            Ok(Some(record.clone()))
        })
    }

    fn seed(&self, invites: &InviteMap) -> StoreResult<()> {
        self.with_map(|map| {
            for (id, record) in invites {
                map.entry(id.clone()).or_insert_with(|| record.clone());
            }
            Ok(())
        })
    }

    fn get_all_invites(&self) -> StoreResult<InviteMap> {
        self.with_map(|map| Ok(map.clone()))
    }

    fn replace_all_invites(&self, invites: &InviteMap) -> StoreResult<()> {
        validate_replacement(invites)?;
        self.with_map(|map| {
            *map = invites.clone();
            Ok(())
        })
    }

    fn close(&self) -> StoreResult<()> {
        self.lock().take().map(|_| ()).ok_or(StoreError::Closed)
    }
}

impl std::fmt::Debug for InMemoryInviteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryInviteStore")
            .field("invite_count", &self.len())
            .finish()
    }
}
