use rsvp_types::{InviteMap, InviteRecord};

use crate::error::StoreResult;

/// Transactional invite store.
///
/// All implementations must satisfy these invariants:
/// - Each method is one atomic unit. Calls on the same id never interleave;
///   the bulk methods never overlap a single-id call.
/// - `get_invite` is a tracked read: it appends a view timestamp and
///   persists it before returning the post-mutation record.
/// - Business-rule failures return `StoreError::Validation` and write
///   nothing.
/// - All I/O errors are propagated, never silently ignored or retried.
///
/// Methods block until the container's write lock is available. Async
/// callers should run them on a blocking thread.
pub trait InviteStore: Send + Sync {
    /// Look up an invite and record the view.
    ///
    /// Returns `Ok(None)` if the id does not exist.
    fn get_invite(&self, id: &str) -> StoreResult<Option<InviteRecord>>;

    /// Accept an invite with the given extra guests.
    ///
    /// Returns `Ok(None)` if the id does not exist. Fails with a validation
    /// error if `accepted` is false or `additional` exceeds the invite's
    /// guest allowance.
    fn update_invite(
        &self,
        id: &str,
        accepted: bool,
        additional: Vec<String>,
    ) -> StoreResult<Option<InviteRecord>>;

    /// Insert every record whose id is not already present. Existing ids are
    /// left untouched, so seeding is idempotent.
    fn seed(&self, invites: &InviteMap) -> StoreResult<()>;

    /// Snapshot of every record as of one committed state.
    fn get_all_invites(&self) -> StoreResult<InviteMap>;

    /// Discard every record and install exactly `invites`.
    ///
    /// Either the whole replacement commits or the previous data stays
    /// intact.
    fn replace_all_invites(&self, invites: &InviteMap) -> StoreResult<()>;

    /// Flush and release the container. Later calls fail with
    /// `StoreError::Closed`.
    fn close(&self) -> StoreResult<()>;
}

/// Check a bulk-replace payload before anything is written.
///
/// Each record needs at least one invitee and must respect its guest bound;
/// audit fields supplied by an administrator are installed as given.
pub(crate) fn validate_replacement(invites: &InviteMap) -> StoreResult<()> {
    for (id, record) in invites {
        if record.people.is_empty() {
            return Err(crate::error::ValidationError::InvalidRecord {
                id: id.clone(),
                reason: "people must not be empty".to_string(),
            }
            .into());
        }
        if let Err(err) = record.check_guest_bound() {
            return Err(crate::error::ValidationError::InvalidRecord {
                id: id.clone(),
                reason: err.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
