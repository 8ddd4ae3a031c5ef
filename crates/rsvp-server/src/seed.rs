use std::io::ErrorKind;
use std::path::Path;

use rsvp_store::InviteStore;
use rsvp_types::SeedData;
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Seed `store` from a JSON file shaped `{"invites": {"<id>": {...}}}`.
///
/// A missing file means seeding is disabled and returns `Ok(0)`. Ids that
/// already exist are left as they are. Returns the number of records in the
/// file.
pub fn load_from_file(path: &Path, store: &dyn InviteStore) -> ServerResult<usize> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "seed file not found, skipping seeding");
            return Ok(0);
        }
        Err(e) => {
            return Err(ServerError::Seed(format!(
                "reading seed file {}: {e}",
                path.display()
            )))
        }
    };

    let seed: SeedData = serde_json::from_slice(&data).map_err(|e| {
        ServerError::Seed(format!("parsing seed file {}: {e}", path.display()))
    })?;

    info!(count = seed.invites.len(), "seeding invites from file");
    store.seed(&seed.invites)?;
    Ok(seed.invites.len())
}
