use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RecordError;

/// Opaque invite key. The public API uses UUIDs; the store does not care.
pub type InviteId = String;

/// A full set of invites keyed by id, ordered for stable output.
pub type InviteMap = BTreeMap<InviteId, InviteRecord>;

/// Persisted state of one invitation.
///
/// Field names are snake_case on the wire so that data files written by
/// earlier deployments decode unchanged. Sequence fields written as `null`
/// decode as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    /// Invitee display names, in display order.
    pub people: Vec<String>,
    /// Maximum number of extra guests this invite may bring.
    #[serde(default)]
    pub additional_count: u32,
    /// Extra guests confirmed on acceptance.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional: Vec<String>,
    /// Whether the invite has been accepted. Never reverts to `false`.
    #[serde(default)]
    pub accepted: bool,
    /// One entry per tracked view, oldest first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub viewed_at: Vec<DateTime<Utc>>,
    /// Time of the most recent acceptance.
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl InviteRecord {
    /// A fresh, unaccepted, never-viewed invite.
    pub fn new(people: Vec<String>, additional_count: u32) -> Self {
        Self {
            people,
            additional_count,
            ..Default::default()
        }
    }

    /// Returns `true` once the invite has been viewed at least once.
    pub fn is_opened(&self) -> bool {
        !self.viewed_at.is_empty()
    }

    /// How many more extra guests could still be confirmed.
    pub fn remaining_slots(&self) -> u32 {
        let used = u32::try_from(self.additional.len()).unwrap_or(u32::MAX);
        self.additional_count.saturating_sub(used)
    }

    /// Check that `additional` fits within `additional_count`.
    pub fn check_guest_bound(&self) -> Result<(), RecordError> {
        Self::check_guests(self.additional.len(), self.additional_count)
    }

    /// Append a view timestamp.
    pub fn record_view(&mut self, at: DateTime<Utc>) {
        self.viewed_at.push(at);
    }

    /// Apply an acceptance.
    ///
    /// The guest list is replaced, not merged, and `accepted_at` moves to
    /// `at` even when the invite was already accepted. On error the record
    /// is left untouched.
    pub fn accept(&mut self, additional: Vec<String>, at: DateTime<Utc>) -> Result<(), RecordError> {
        Self::check_guests(additional.len(), self.additional_count)?;
        self.accepted = true;
        self.additional = additional;
        self.accepted_at = Some(at);
        Ok(())
    }

    fn check_guests(got: usize, max: u32) -> Result<(), RecordError> {
        if u64::try_from(got).unwrap_or(u64::MAX) > u64::from(max) {
            return Err(RecordError::TooManyGuests { got, max });
        }
        Ok(())
    }
}

/// Shape of the initial dataset file: `{"invites": {"<id>": {...}}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub invites: InviteMap,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
