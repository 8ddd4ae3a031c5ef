//! Request contract for the public invite API.
//!
//! This layer sits in front of the handlers and rejects malformed requests
//! before the store is involved. It is driven entirely by [`SchemaConfig`],
//! so the contract can change without touching handler code. The store
//! enforces its own business rules independently.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::config::SchemaConfig;
use crate::error::{ApiError, ServerError, ServerResult};

/// Upper bound on accepted request bodies.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// A single contract violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("invite id must be a UUID, got {0:?}")]
    InvalidId(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing required field \"isAccepted\"")]
    MissingAccepted,

    #[error("field \"isAccepted\" must be a boolean")]
    AcceptedNotBoolean,

    #[error("field \"additional\" must be an array of strings")]
    AdditionalNotStrings,

    #[error("field \"additional\" has {got} items, at most {max} allowed")]
    TooManyAdditional { got: usize, max: usize },

    #[error("additional[{index}] is not a valid guest name")]
    InvalidName { index: usize },
}

/// Compiled request contract.
#[derive(Debug)]
pub struct InviteSchema {
    max_additional: usize,
    name_pattern: Regex,
}

impl InviteSchema {
    pub fn new(config: &SchemaConfig) -> ServerResult<Self> {
        let name_pattern = Regex::new(&config.name_pattern)
            .map_err(|e| ServerError::Config(format!("invalid name pattern: {e}")))?;
        Ok(Self {
            max_additional: config.max_additional,
            name_pattern,
        })
    }

    pub fn validate_id(&self, id: &str) -> Result<Uuid, SchemaViolation> {
        Uuid::parse_str(id).map_err(|_| SchemaViolation::InvalidId(id.to_string()))
    }

    /// Validate an accept request body.
    pub fn validate_update(&self, body: &Value) -> Result<(), SchemaViolation> {
        let object = body.as_object().ok_or(SchemaViolation::NotAnObject)?;

        let accepted = object
            .get("isAccepted")
            .or_else(|| object.get("accepted"))
            .ok_or(SchemaViolation::MissingAccepted)?;
        if !accepted.is_boolean() {
            return Err(SchemaViolation::AcceptedNotBoolean);
        }

        let names = match object.get("additional") {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Array(names)) => names,
            Some(_) => return Err(SchemaViolation::AdditionalNotStrings),
        };
        if names.len() > self.max_additional {
            return Err(SchemaViolation::TooManyAdditional {
                got: names.len(),
                max: self.max_additional,
            });
        }
        for (index, name) in names.iter().enumerate() {
            let name = name.as_str().ok_or(SchemaViolation::AdditionalNotStrings)?;
            if !self.name_pattern.is_match(name) {
                return Err(SchemaViolation::InvalidName { index });
            }
        }
        Ok(())
    }
}

/// Store key for a public invite id: the lowercase hyphenated form, whatever
/// UUID spelling the client used. `None` if `raw` is not a UUID.
pub fn canonical_invite_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw)
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Middleware for `/invites/:id` routes. Install with `route_layer` so the
/// path parameter is available.
pub async fn validate_request(
    State(schema): State<Arc<InviteSchema>>,
    Path(id): Path<String>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if let Err(violation) = schema.validate_id(&id) {
        return reject(&path, violation);
    }
    if request.method() != Method::PUT {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::bad_request("invalid request body").into_response(),
    };
    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return ApiError::bad_request("invalid request body").into_response(),
    };
    if let Err(violation) = schema.validate_update(&value) {
        return reject(&path, violation);
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn reject(path: &str, violation: SchemaViolation) -> Response {
    warn!(path, error = %violation, "request validation failed");
    ApiError::bad_request(violation.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> InviteSchema {
        InviteSchema::new(&SchemaConfig::default()).unwrap()
    }

    #[test]
    fn accepts_valid_update() {
        let s = schema();
        assert!(s
            .validate_update(&json!({"isAccepted": true, "additional": ["Иван Петров"]}))
            .is_ok());
        assert!(s.validate_update(&json!({"accepted": false})).is_ok());
        assert!(s
            .validate_update(&json!({"isAccepted": true, "additional": null}))
            .is_ok());
    }

    #[test]
    fn rejects_latin_names() {
        let err = schema()
            .validate_update(&json!({"isAccepted": true, "additional": ["John Doe"]}))
            .unwrap_err();
        assert_eq!(err, SchemaViolation::InvalidName { index: 0 });
    }

    #[test]
    fn rejects_digits_and_mixed_script() {
        let s = schema();
        for name in ["Иван123", "Ivan Петров", "", " Иван", "Иван  Петров"] {
            assert!(
                s.validate_update(&json!({"isAccepted": true, "additional": [name]}))
                    .is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_hyphenated_and_apostrophe_names() {
        let s = schema();
        for name in ["Анна-Мария", "Д'Артанян", "Ёлка Ёжикова"] {
            assert!(
                s.validate_update(&json!({"isAccepted": true, "additional": [name]}))
                    .is_ok(),
                "{name:?} should be accepted"
            );
        }
    }

    #[test]
    fn rejects_more_than_five_additional() {
        let names = vec!["Иван"; 6];
        let err = schema()
            .validate_update(&json!({"isAccepted": true, "additional": names}))
            .unwrap_err();
        assert_eq!(err, SchemaViolation::TooManyAdditional { got: 6, max: 5 });
    }

    #[test]
    fn rejects_missing_or_mistyped_accepted() {
        let s = schema();
        assert_eq!(
            s.validate_update(&json!({"additional": ["Иван"]})),
            Err(SchemaViolation::MissingAccepted)
        );
        assert_eq!(
            s.validate_update(&json!({"isAccepted": "yes"})),
            Err(SchemaViolation::AcceptedNotBoolean)
        );
        assert_eq!(
            s.validate_update(&json!([true])),
            Err(SchemaViolation::NotAnObject)
        );
        assert_eq!(
            s.validate_update(&json!({"isAccepted": true, "additional": [1]})),
            Err(SchemaViolation::AdditionalNotStrings)
        );
    }

    #[test]
    fn validates_ids() {
        let s = schema();
        assert!(s.validate_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(s.validate_id("not-a-uuid").is_err());
    }

    #[test]
    fn canonical_id_normalises_uuid_spellings() {
        let canonical = "aaaa0000-0000-0000-0000-000000000001";
        for raw in [
            canonical,
            "AAAA0000-0000-0000-0000-000000000001",
            "aaaa0000000000000000000000000001",
            "{aaaa0000-0000-0000-0000-000000000001}",
            "urn:uuid:aaaa0000-0000-0000-0000-000000000001",
        ] {
            assert_eq!(canonical_invite_id(raw).as_deref(), Some(canonical), "{raw}");
        }
        assert_eq!(canonical_invite_id("not-a-uuid"), None);
    }

    #[test]
    fn limits_come_from_config() {
        let s = InviteSchema::new(&SchemaConfig {
            max_additional: 1,
            name_pattern: "^[A-Za-z ]+$".into(),
        })
        .unwrap();
        assert!(s
            .validate_update(&json!({"isAccepted": true, "additional": ["John Doe"]}))
            .is_ok());
        assert!(s
            .validate_update(&json!({"isAccepted": true, "additional": ["A", "B"]}))
            .is_err());
    }

    #[test]
    fn bad_pattern_is_config_error() {
        let err = InviteSchema::new(&SchemaConfig {
            max_additional: 5,
            name_pattern: "(".into(),
        })
        .unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
