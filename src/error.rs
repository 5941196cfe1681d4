//! Unified error type for the platform client.

use std::fmt;
use thiserror::Error;

/// Errors surfaced at the client facade.
#[derive(Error, Debug)]
pub enum Error {
    /// Identity provider errors.
    #[error("auth error: {0}")]
    Auth(#[from] agrodrone_auth::AuthError),

    /// Document store errors.
    #[error("store error: {0}")]
    Store(#[from] agrodrone_store::StoreError),

    /// Policy, validation and workflow errors.
    #[error(transparent)]
    Domain(#[from] agrodrone_domain::DomainError),

    /// URL parsing errors.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }
}
