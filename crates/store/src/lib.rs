//! Document store client for the agrodrone platform
//!
//! The hosted provider exposes schemaless collections over HTTP. This crate
//! wraps that surface behind the [`DocumentStore`] trait so the domain layer
//! can run against the real backend ([`HttpDocumentStore`]) or an in-process
//! one ([`MemoryStore`]) without changing shape.
//!
//! Documents are plain JSON objects carrying their `id` field once stored.
//! Queries are built with [`Query`] and executed server-side; live result
//! sets are delivered through [`Subscription`], a scoped resource that is
//! released on [`Subscription::unsubscribe`] and on drop.

use thiserror::Error;

pub mod http;
pub mod memory;
pub mod query;
pub mod subscription;

pub use http::HttpDocumentStore;
pub use memory::MemoryStore;
pub use query::{Filter, Ordering, Query, SortDirection, IN_FILTER_LIMIT};
pub use subscription::Subscription;

use async_trait::async_trait;
use serde_json::Value;

/// Errors surfaced by store operations.
///
/// The store performs no internal retry; network and API failures are
/// returned to the caller, which owns the retry decision.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("API error: {message} (status: {status})")]
    Api {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Operations every document store backend exposes.
///
/// `data` and `patch` payloads must be JSON objects; the store assigns and
/// returns document ids on `create` and injects the id into the stored
/// object, so query results can be deserialized into id-carrying records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document, returning its store-assigned id.
    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// Create or replace a document under a caller-chosen id.
    ///
    /// Used where the id is owned elsewhere, e.g. profile documents keyed
    /// by the identity provider's uid.
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Fetch a single document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    /// Apply a partial update to an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Execute a query, returning the matching documents.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Count documents matching a query without fetching them.
    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError>;

    /// Open a live subscription on a query.
    ///
    /// The initial snapshot is delivered first, then a fresh snapshot on
    /// every observed change. The subscription stays active until the
    /// returned handle is unsubscribed or dropped.
    async fn subscribe(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Subscription, StoreError>;
}

/// Query a collection for documents whose `field` matches any of `ids`,
/// chunking the id list at the provider's `in`-filter limit.
///
/// The provider rejects disjunctions larger than [`IN_FILTER_LIMIT`]
/// elements, so the id list is split into batches, one query per batch, and
/// the results merged client-side: duplicates removed by id, then re-sorted
/// under the template query's ordering so the combined result honors the
/// same contract a single query would.
pub async fn query_in_batches<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    field: &str,
    ids: &[String],
    template: &Query,
) -> Result<Vec<Value>, StoreError> {
    let mut merged: Vec<Value> = Vec::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    for chunk in ids.chunks(IN_FILTER_LIMIT) {
        let batch_query = template.clone().filter(Filter::In(
            field.to_string(),
            chunk.to_vec(),
        ));
        let docs = store.query(collection, &batch_query).await?;
        for doc in docs {
            let id = doc
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if seen.insert(id) {
                merged.push(doc);
            }
        }
    }

    if let Some(ordering) = &template.ordering {
        query::sort_documents(&mut merged, ordering);
    }
    Ok(merged)
}
