//! Entity repositories.
//!
//! Thin, typed access to the provider collections. Each repository is
//! generic over the [`DocumentStore`] backend, serializes entities to the
//! wire encoding and deserializes query results back into records. Owner
//! queries order newest-first on the relevant date field; the store layer
//! guarantees an id tie-break for equal timestamps.
//!
//! Repositories never retry: store failures surface to the caller.

use agrodrone_store::{query_in_batches, DocumentStore, Query, StoreError, Subscription};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::model::{Flight, Fumigation, ServiceRequest, UserProfile};

/// Provider collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FLIGHTS: &str = "flights";
    pub const FUMIGATIONS: &str = "fumigations";
    pub const SERVICE_REQUESTS: &str = "serviceRequests";
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Deserialization(e.to_string()))
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, StoreError> {
    docs.into_iter().map(decode).collect()
}

/// Profile documents, keyed by the identity provider uid.
pub struct UserRepository<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> UserRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> Result<UserProfile, StoreError> {
        decode(self.store.get(collections::USERS, uid).await?)
    }

    /// Create or replace the profile document for a uid.
    pub async fn put(&self, uid: &str, profile: Value) -> Result<(), StoreError> {
        self.store.put(collections::USERS, uid, profile).await
    }

    pub async fn set_role(&self, uid: &str, role: &str) -> Result<(), StoreError> {
        self.store
            .update(
                collections::USERS,
                uid,
                serde_json::json!({ "role": role }),
            )
            .await
    }

    /// All profiles, ordered by email as the admin listing expects.
    pub async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let docs = self
            .store
            .query(collections::USERS, &Query::new().order_asc("email"))
            .await?;
        decode_all(docs)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.store.count(collections::USERS, &Query::new()).await
    }
}

/// Flight records.
pub struct FlightRepository<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> FlightRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, flight: Value) -> Result<String, StoreError> {
        self.store.create(collections::FLIGHTS, flight).await
    }

    pub async fn get(&self, id: &str) -> Result<Flight, StoreError> {
        decode(self.store.get(collections::FLIGHTS, id).await?)
    }

    /// Mark a flight completed, refreshing its update timestamp.
    pub async fn mark_completed(&self, id: &str, updated_at: &str) -> Result<(), StoreError> {
        self.store
            .update(
                collections::FLIGHTS,
                id,
                serde_json::json!({ "status": "completed", "updatedAt": updated_at }),
            )
            .await
    }

    /// An operator's flights, newest scheduled date first.
    pub async fn by_operator(&self, operator_id: &str) -> Result<Vec<Flight>, StoreError> {
        let docs = self
            .store
            .query(collections::FLIGHTS, &Self::operator_query(operator_id))
            .await?;
        decode_all(docs)
    }

    /// Live view of an operator's flights. The subscription must be
    /// released (or dropped) when the consuming view goes away.
    pub async fn watch_by_operator(&self, operator_id: &str) -> Result<Subscription, StoreError> {
        self.store
            .subscribe(collections::FLIGHTS, &Self::operator_query(operator_id))
            .await
    }

    /// A farmer's completed flights, newest scheduled date first.
    pub async fn completed_for_farmer(&self, farmer_id: &str) -> Result<Vec<Flight>, StoreError> {
        let docs = self
            .store
            .query(
                collections::FLIGHTS,
                &Query::new()
                    .eq("farmerId", farmer_id)
                    .eq("status", "completed")
                    .order_desc("scheduledDate"),
            )
            .await?;
        decode_all(docs)
    }

    /// Every flight across operators, newest registration first.
    pub async fn list_all(&self) -> Result<Vec<Flight>, StoreError> {
        let docs = self
            .store
            .query(collections::FLIGHTS, &Query::new().order_desc("createdAt"))
            .await?;
        decode_all(docs)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.store.count(collections::FLIGHTS, &Query::new()).await
    }

    fn operator_query(operator_id: &str) -> Query {
        Query::new()
            .eq("operatorId", operator_id)
            .order_desc("scheduledDate")
    }
}

/// Fumigation records. Write-once: the repository offers no update path.
pub struct FumigationRepository<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> FumigationRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, fumigation: Value) -> Result<String, StoreError> {
        self.store.create(collections::FUMIGATIONS, fumigation).await
    }

    /// Fumigations for a set of flights, newest first.
    ///
    /// The id list is chunked at the provider's `in`-filter limit and the
    /// results merged under the combined ordering contract.
    pub async fn by_flight_ids(&self, flight_ids: &[String]) -> Result<Vec<Fumigation>, StoreError> {
        let docs = query_in_batches(
            self.store.as_ref(),
            collections::FUMIGATIONS,
            "flightId",
            flight_ids,
            &Query::new().order_desc("fumigationDate"),
        )
        .await?;
        decode_all(docs)
    }
}

/// Service request records. Created by farmers, never mutated in-app.
pub struct ServiceRequestRepository<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> ServiceRequestRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: Value) -> Result<String, StoreError> {
        self.store
            .create(collections::SERVICE_REQUESTS, request)
            .await
    }

    /// A farmer's own requests, newest first.
    pub async fn by_farmer(&self, farmer_id: &str) -> Result<Vec<ServiceRequest>, StoreError> {
        let docs = self
            .store
            .query(
                collections::SERVICE_REQUESTS,
                &Query::new()
                    .eq("farmerId", farmer_id)
                    .order_desc("requestDate"),
            )
            .await?;
        decode_all(docs)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.store
            .count(collections::SERVICE_REQUESTS, &Query::new())
            .await
    }
}
