//! Error taxonomy for domain operations.

use crate::role::{Capability, Role};
use agrodrone_auth::AuthError;
use agrodrone_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the workflow engine and session manager.
///
/// Validation failures are local and user-visible; policy denials are
/// raised before any store call; store and auth failures pass through so
/// the caller can decide whether to retry or re-prompt.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{role} is not permitted to {capability}")]
    Forbidden { role: Role, capability: Capability },

    #[error("flight {flight_id} does not belong to operator {operator_id}")]
    NotOwner {
        flight_id: String,
        operator_id: String,
    },

    #[error("flight {flight_id} is already completed")]
    AlreadyCompleted { flight_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
