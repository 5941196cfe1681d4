//! Agrodrone Client Library
//!
//! Client and domain core for coordinating agricultural drone-spraying
//! services between farmers, drone operators and administrators. The
//! backend is a hosted identity provider plus a schemaless document store;
//! this crate wires them together behind one entry point.
//!
//! The pieces live in dedicated crates and are re-exported here:
//! `agrodrone-auth` for identity, `agrodrone-store` for documents and live
//! queries, `agrodrone-domain` for entities, role policy and the workflow
//! engine.

pub mod config;
pub mod error;

pub use agrodrone_auth as auth;
pub use agrodrone_domain as domain;
pub use agrodrone_store as store;

use reqwest::Client;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use agrodrone_auth::AuthClient;
use agrodrone_domain::{SessionContext, SessionManager, WorkflowEngine};
use agrodrone_store::HttpDocumentStore;

/// The main entry point for the agrodrone client.
pub struct Agrodrone {
    config: Config,
    http_client: Client,
    auth: Arc<AuthClient>,
    document_store: Arc<HttpDocumentStore>,
    sessions: SessionManager<HttpDocumentStore>,
    workflow: WorkflowEngine<HttpDocumentStore>,
}

impl Agrodrone {
    /// Create a client against a backend project.
    ///
    /// # Example
    ///
    /// ```
    /// use agrodrone::Agrodrone;
    ///
    /// let client = Agrodrone::new("https://your-project.example.com", "your-anon-key");
    /// ```
    pub fn new(url: &str, api_key: &str) -> Self {
        Self::with_config(Config::new(url, api_key))
    }

    /// Create a client from a [`Config`].
    pub fn with_config(config: Config) -> Self {
        let http_client = Client::new();
        let auth = Arc::new(AuthClient::new(
            &config.url,
            &config.api_key,
            http_client.clone(),
        ));
        let document_store = Arc::new(
            HttpDocumentStore::new(&config.url, &config.api_key, http_client.clone())
                .with_poll_interval(config.poll_interval),
        );
        let sessions = SessionManager::new(auth.clone(), document_store.clone());
        let workflow = WorkflowEngine::new(document_store.clone());

        Self {
            config,
            http_client,
            auth,
            document_store,
            sessions,
            workflow,
        }
    }

    /// Create a client from `AGRODRONE_URL` and `AGRODRONE_API_KEY`.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::with_config(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The identity provider client.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// The document store backend.
    pub fn document_store(&self) -> Arc<HttpDocumentStore> {
        self.document_store.clone()
    }

    /// The session manager owning sign-in and the actor context.
    pub fn sessions(&self) -> &SessionManager<HttpDocumentStore> {
        &self.sessions
    }

    /// The workflow engine gating every platform operation.
    pub fn workflow(&self) -> &WorkflowEngine<HttpDocumentStore> {
        &self.workflow
    }

    /// The signed-in actor, if any.
    pub fn current_actor(&self) -> Option<SessionContext> {
        self.sessions.current()
    }

    /// The underlying HTTP client, shared across components.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::Error;
    pub use crate::Agrodrone;
    pub use agrodrone_domain::{
        calculate_mix, Capability, DomainError, Flight, FlightDraft, FlightStatus, Fumigation,
        FumigationReport, MixInput, MixPlan, Product, Role, ServiceRequest, ServiceRequestDraft,
        SessionContext, UserProfile, WorkflowEngine,
    };
}
