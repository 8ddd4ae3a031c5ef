use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use rsvp_types::{InviteUpdate, InviteView};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::schema::canonical_invite_id;
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// Health check handler.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET /invites/:id`. Every successful fetch records a view.
pub async fn get_invite(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<InviteView>, ApiError> {
    let id = invite_key(&raw_id)?;
    let lookup = id.clone();
    let record = state
        .run(move |store| store.get_invite(&lookup))
        .await?
        .map_err(|err| {
            error!(invite_id = %id, error = %err, "failed to get invite");
            ApiError::internal()
        })?
        .ok_or_else(ApiError::not_found)?;

    info!(invite_id = %id, "invite viewed");
    Ok(Json(InviteView::from(&record)))
}

/// `PUT /invites/:id`. Only acceptance is allowed; there is no way to
/// decline or withdraw through the public API.
pub async fn put_invite(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<InviteUpdate>, JsonRejection>,
) -> Result<Json<InviteView>, ApiError> {
    let id = invite_key(&raw_id)?;
    let Json(update) = body.map_err(|rejection| {
        warn!(invite_id = %id, error = %rejection, "invalid request body");
        ApiError::bad_request("invalid request body")
    })?;

    if !update.is_accepted {
        return Err(ApiError::bad_request(
            "only accepted=true updates are allowed",
        ));
    }
    let additional = update.additional.unwrap_or_default();

    let lookup = id.clone();
    let record = state
        .run(move |store| store.update_invite(&lookup, true, additional))
        .await?
        .map_err(|err| {
            if err.is_validation() {
                warn!(invite_id = %id, error = %err, "invite update rejected");
            } else {
                error!(invite_id = %id, error = %err, "failed to update invite");
            }
            ApiError::from(err)
        })?
        .ok_or_else(ApiError::not_found)?;

    info!(invite_id = %id, additional = record.additional.len(), "invite accepted");
    Ok(Json(InviteView::from(&record)))
}

fn invite_key(raw: &str) -> Result<String, ApiError> {
    canonical_invite_id(raw).ok_or_else(|| ApiError::bad_request("invalid invite id"))
}
