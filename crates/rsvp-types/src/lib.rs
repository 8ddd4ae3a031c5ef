//! Foundation types for the RSVP ledger.
//!
//! Every other crate in the workspace depends on `rsvp-types`. It owns the
//! shape of an invite record and the rules a record must obey, independent
//! of how records are persisted or served.
//!
//! # Key Types
//!
//! - [`InviteRecord`]: persisted state of one invitation
//! - [`InviteView`]: public projection returned by the invite API
//! - [`InviteUpdate`]: public accept request body
//! - [`SeedData`]: shape of the initial dataset file
//!
//! # Record Invariants
//!
//! 1. `additional.len() <= additional_count`.
//! 2. `accepted` only ever moves from `false` to `true`.
//! 3. Accepting an invite stamps `accepted_at`.
//! 4. `viewed_at` grows by one entry per tracked view and never shrinks.

pub mod error;
pub mod record;
pub mod view;

pub use error::RecordError;
pub use record::{InviteId, InviteMap, InviteRecord, SeedData};
pub use view::{InviteUpdate, InviteView};
