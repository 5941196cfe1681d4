//! HTTP backend for the hosted document store.
//!
//! Collections are exposed under `{base}/v1/{collection}`; filters, ordering
//! and limits travel as URL query pairs. The change feed is modeled as a
//! polling watcher: the provider offers no push transport on this surface,
//! so the watcher re-executes the query on an interval and emits a snapshot
//! whenever the result set differs from the last one delivered.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use crate::query::Query;
use crate::subscription::Subscription;
use crate::{DocumentStore, StoreError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Document store client backed by the provider's HTTP API.
#[derive(Clone)]
pub struct HttpDocumentStore {
    base_url: String,
    api_key: String,
    http_client: Client,
    auth_token: Option<String>,
    poll_interval: Duration,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
            auth_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Attach the signed-in user's access token to subsequent requests.
    pub fn with_auth(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Override the watcher poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| StoreError::InvalidQuery("invalid API key header".to_string()))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        if let Some(token) = &self.auth_token {
            headers.insert(
                HeaderName::from_static("authorization"),
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    StoreError::InvalidQuery("invalid authorization header".to_string())
                })?,
            );
        }
        Ok(headers)
    }

    fn collection_url(&self, collection: &str, query: Option<&Query>) -> Result<String, StoreError> {
        let mut url = Url::parse(&format!("{}/v1/{}", self.base_url, collection))?;
        if let Some(query) = query {
            for (key, value) in query.to_query_pairs() {
                url.query_pairs_mut().append_pair(&key, &value);
            }
        }
        Ok(url.to_string())
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<String, StoreError> {
        let url = Url::parse(&format!("{}/v1/{}/{}", self.base_url, collection, id))?;
        Ok(url.to_string())
    }
}

async fn api_error(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error response".to_string());
    // Providers return {"message": "..."} on errors; fall back to raw text.
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(body);
    StoreError::Api { message, status }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let url = self.collection_url(collection, None)?;
        let mut headers = self.headers()?;
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return=representation"),
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        // The provider returns the stored representation as a one-element
        // array carrying the assigned id.
        let body: Value = response.json().await?;
        let created = match &body {
            Value::Array(rows) => rows.first().cloned(),
            Value::Object(_) => Some(body.clone()),
            _ => None,
        };
        created
            .as_ref()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                StoreError::Deserialization("no document id returned after create".to_string())
            })
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .http_client
            .put(&url)
            .headers(self.headers()?)
            .json(&data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .http_client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .http_client
            .patch(&url)
            .headers(self.headers()?)
            .json(&patch)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let url = self.collection_url(collection, Some(query))?;
        let response = self
            .http_client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
        let mut url = Url::parse(&self.collection_url(collection, Some(query))?)?;
        url.query_pairs_mut().append_pair("count", "exact");

        let response = self
            .http_client
            .get(url.as_str())
            .headers(self.headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let body: Value = response.json().await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::Deserialization("count missing in response".to_string()))
    }

    async fn subscribe(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let store = self.clone();
        let collection = collection.to_string();
        let query = query.clone();
        let stop_flag = stop.clone();
        let interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut last: Option<Vec<Value>> = None;
            loop {
                if stop_flag.load(AtomicOrdering::SeqCst) {
                    break;
                }
                match store.query(&collection, &query).await {
                    Ok(snapshot) => {
                        if last.as_ref() != Some(&snapshot) {
                            last = Some(snapshot.clone());
                            if tx.send(snapshot).is_err() {
                                // Receiver dropped without unsubscribe.
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("watcher poll failed for {}: {}", collection, e);
                    }
                }
                tokio::time::sleep(interval).await;
            }
            debug!("watcher for {} stopped", collection);
        });

        Ok(Subscription::new(rx, stop, task))
    }
}
