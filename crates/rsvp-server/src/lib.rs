//! HTTP service for the RSVP ledger.
//!
//! Two listeners share one [`rsvp_store::InviteStore`]:
//!
//! - the public API (`/health`, `/invites/:id`) behind a per-client rate
//!   limiter and a request-contract validator;
//! - the admin API (`/admin/invites`) for bulk export and replacement,
//!   which has no authentication and must only be reachable from a trusted
//!   network.
//!
//! Errors are returned as `{"message": "..."}` bodies.

pub mod admin;
pub mod config;
pub mod error;
pub mod handler;
pub mod rate_limit;
pub mod router;
pub mod schema;
pub mod seed;
pub mod server;
pub mod state;

pub use config::{RateLimitConfig, SchemaConfig, ServerConfig, CYRILLIC_NAME_PATTERN};
pub use error::{ApiError, ErrorBody, ServerError, ServerResult};
pub use rate_limit::RateLimiter;
pub use router::{admin_router, public_router};
pub use schema::{InviteSchema, SchemaViolation};
pub use server::RsvpServer;
pub use state::AppState;
