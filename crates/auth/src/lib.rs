//! Identity provider client for the agrodrone platform
//!
//! Wraps the hosted authentication service: registration, email/password
//! sign-in, password recovery and sign-out. The current session is held
//! behind a shared lock and session transitions are fanned out over a
//! broadcast channel, so the rest of the system consumes identity
//! read-only and reacts to [`AuthEvent`]s instead of polling.

use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors surfaced by the identity provider.
///
/// Provider error payloads (bad credentials, weak password, email in use)
/// are carried verbatim in [`AuthError::Api`] so callers can show them to
/// the user unchanged.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no active session")]
    MissingSession,
}

/// The authenticated identity as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

/// An issued session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: Identity,
}

/// Session state transitions, delivered asynchronously to every listener.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Client for the hosted identity provider.
pub struct AuthClient {
    url: String,
    key: String,
    http_client: Client,
    current_session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(url: &str, key: &str, http_client: Client) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            current_session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Subscribe to session state changes.
    ///
    /// The receiver sees a [`AuthEvent::SignedIn`] after every successful
    /// sign-up or sign-in and a [`AuthEvent::SignedOut`] after sign-out.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Register a new account with email and password.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/signup", self.url);
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::Api(error_text));
        }

        let session: Session = response.json().await?;
        self.store_session(session.clone());
        Ok(session)
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::Api(error_text));
        }

        let session: Session = response.json().await?;
        self.store_session(session.clone());
        Ok(session)
    }

    /// Send a password recovery email.
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/recover", self.url);
        let payload = serde_json::json!({
            "email": email,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::Api(error_text));
        }
        Ok(())
    }

    /// Sign out, invalidating the current session.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.current_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/logout", self.url);
        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::Api(error_text));
        }

        {
            let mut write_guard = self.current_session.write().unwrap();
            *write_guard = None;
        }
        let _ = self.events.send(AuthEvent::SignedOut);
        debug!("session cleared");
        Ok(())
    }

    /// The current session, if signed in.
    pub fn current_session(&self) -> Option<Session> {
        self.current_session.read().unwrap().clone()
    }

    /// The current identity, if signed in.
    pub fn current_identity(&self) -> Option<Identity> {
        self.current_session().map(|s| s.user)
    }

    /// The current access token, if signed in.
    pub fn access_token(&self) -> Result<String, AuthError> {
        self.current_session()
            .map(|s| s.access_token)
            .ok_or(AuthError::MissingSession)
    }

    fn store_session(&self, session: Session) {
        let identity = session.user.clone();
        {
            let mut write_guard = self.current_session.write().unwrap();
            *write_guard = Some(session);
        }
        let _ = self.events.send(AuthEvent::SignedIn(identity));
        debug!("session stored");
    }
}
