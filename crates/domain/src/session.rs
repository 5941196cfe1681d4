//! Session manager.
//!
//! Bridges the identity provider and the profile collection: after a
//! sign-in the provider only knows the uid and email, so the manager
//! resolves the profile document to attach a [`Role`] and hands the
//! combined [`SessionContext`] to the workflow engine.

use agrodrone_auth::{AuthClient, AuthEvent, Identity};
use agrodrone_store::{DocumentStore, StoreError};
use chrono::Utc;
use log::warn;
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::error::DomainError;
use crate::repo::UserRepository;
use crate::role::Role;

/// The signed-in actor as seen by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub uid: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Owns the sign-in lifecycle and the current actor context.
pub struct SessionManager<S> {
    auth: Arc<AuthClient>,
    users: UserRepository<S>,
    current: RwLock<Option<SessionContext>>,
}

impl<S: DocumentStore> SessionManager<S> {
    pub fn new(auth: Arc<AuthClient>, store: Arc<S>) -> Self {
        Self {
            auth,
            users: UserRepository::new(store),
            current: RwLock::new(None),
        }
    }

    /// Session state transitions from the identity provider.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth.on_auth_state_change()
    }

    /// Register a new account and create its profile document.
    ///
    /// Every new account starts as a farmer; only an admin can raise the
    /// role afterwards.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SessionContext, DomainError> {
        let session = self.auth.sign_up(email, password).await?;
        let uid = session.user.id.clone();
        self.users
            .put(
                &uid,
                json!({
                    "id": uid,
                    "uid": uid,
                    "email": email,
                    "name": name,
                    "role": Role::Farmer.as_str(),
                    "createdAt": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        let context = SessionContext {
            uid,
            email: session.user.email.clone(),
            role: Role::Farmer,
        };
        self.store(context.clone());
        Ok(context)
    }

    /// Sign in and resolve the actor's role from the profile collection.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionContext, DomainError> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        let context = self.resolve(&session.user).await?;
        self.store(context.clone());
        Ok(context)
    }

    /// Send a password recovery email. No session required.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        self.auth.reset_password_for_email(email).await?;
        Ok(())
    }

    /// Sign out and clear the actor context.
    pub async fn sign_out(&self) -> Result<(), DomainError> {
        self.auth.sign_out().await?;
        *self.current.write().unwrap() = None;
        Ok(())
    }

    /// The current actor, if signed in.
    pub fn current(&self) -> Option<SessionContext> {
        self.current.read().unwrap().clone()
    }

    /// Resolve an identity into an actor context.
    ///
    /// A uid with no profile document is an integrity gap, not an error:
    /// the account exists with the provider, so the session proceeds with
    /// the least-privileged role and a warning.
    pub async fn resolve(&self, identity: &Identity) -> Result<SessionContext, DomainError> {
        let role = match self.users.get(&identity.id).await {
            Ok(profile) => Role::from_wire(&profile.role),
            Err(StoreError::NotFound { .. }) => {
                warn!("no profile document for uid {}, defaulting to farmer", identity.id);
                Role::Farmer
            }
            Err(e) => return Err(e.into()),
        };
        Ok(SessionContext {
            uid: identity.id.clone(),
            email: identity.email.clone(),
            role,
        })
    }

    fn store(&self, context: SessionContext) {
        *self.current.write().unwrap() = Some(context);
    }
}
