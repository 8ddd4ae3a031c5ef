//! Transactional invite storage for the RSVP ledger.
//!
//! The store is the only component that writes invite records. Every
//! operation runs as one indivisible unit against the backing container,
//! so the record invariants documented in `rsvp-types` hold before and
//! after every call, under any interleaving of callers.
//!
//! # Backends
//!
//! All backends implement the [`InviteStore`] trait:
//!
//! - [`RedbInviteStore`] -- file-backed store on a single redb table
//! - [`InMemoryInviteStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A tracked read (`get_invite`) is a write: it appends a view timestamp
//!    and persists it before returning, inside one write transaction.
//! 2. Validation happens inside the same transaction as the write it guards.
//! 3. Bulk replace is all-or-nothing.
//! 4. The store never logs or swallows errors; callers decide presentation.
//! 5. No internal retries.

pub mod codec;
pub mod error;
pub mod memory;
pub mod redb_store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{CodecError, RecordCodec};
pub use error::{StoreError, StoreOpenError, StoreResult, ValidationError};
pub use memory::InMemoryInviteStore;
pub use redb_store::{RedbInviteStore, StoreOptions, INVITES};
pub use traits::InviteStore;
