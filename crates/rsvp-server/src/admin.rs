//! Admin bulk API. Unauthenticated: bind it to a private interface.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use rsvp_types::InviteMap;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /admin/invites`: every record, keyed by id, audit fields included.
pub async fn get_admin_invites(State(state): State<AppState>) -> Result<Json<InviteMap>, ApiError> {
    let invites = state
        .run(|store| store.get_all_invites())
        .await?
        .map_err(|err| {
            error!(error = %err, "failed to list invites");
            ApiError::internal()
        })?;
    Ok(Json(invites))
}

/// `PUT /admin/invites`: replace the whole dataset and echo it back.
pub async fn put_admin_invites(
    State(state): State<AppState>,
    body: Result<Json<InviteMap>, JsonRejection>,
) -> Result<Json<InviteMap>, ApiError> {
    let Json(invites) = body.map_err(|rejection| {
        warn!(error = %rejection, "invalid admin request body");
        ApiError::bad_request("invalid request body")
    })?;

    let count = invites.len();
    let invites = state
        .run(move |store| store.replace_all_invites(&invites).map(|()| invites))
        .await?
        .map_err(|err| {
            if err.is_validation() {
                warn!(error = %err, "invite replacement rejected");
            } else {
                error!(error = %err, "failed to replace invites");
            }
            ApiError::from(err)
        })?;

    info!(count, "invites replaced");
    Ok(Json(invites))
}
