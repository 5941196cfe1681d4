//! Workflow engine.
//!
//! Applies role policy and entity state to decide which transitions are
//! legal, then executes them through the repositories. Every operation
//! checks the actor's capability first, so a denied action never reaches
//! the store.

use agrodrone_store::{DocumentStore, Subscription};
use chrono::Utc;
use log::warn;
use serde_json::json;
use std::sync::Arc;

use crate::error::DomainError;
use crate::model::{
    Flight, FlightDraft, FlightStatus, Fumigation, FumigationReport, ServiceRequest,
    ServiceRequestDraft, UserProfile,
};
use crate::repo::{
    FlightRepository, FumigationRepository, ServiceRequestRepository, UserRepository,
};
use crate::role::{Capability, Role};
use crate::session::SessionContext;
use crate::stats::{flights_with_product, PlatformStats};

/// Gates and executes every state-changing operation.
pub struct WorkflowEngine<S> {
    users: UserRepository<S>,
    flights: FlightRepository<S>,
    fumigations: FumigationRepository<S>,
    requests: ServiceRequestRepository<S>,
}

impl<S: DocumentStore> WorkflowEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            flights: FlightRepository::new(store.clone()),
            fumigations: FumigationRepository::new(store.clone()),
            requests: ServiceRequestRepository::new(store),
        }
    }

    fn require(actor: &SessionContext, capability: Capability) -> Result<(), DomainError> {
        if actor.role.allows(capability) {
            Ok(())
        } else {
            Err(DomainError::Forbidden {
                role: actor.role,
                capability,
            })
        }
    }

    /// Register a new flight owned by the acting operator.
    ///
    /// The flight starts `scheduled`; `operator_id` is always the actor,
    /// never caller-supplied.
    pub async fn register_flight(
        &self,
        actor: &SessionContext,
        draft: FlightDraft,
    ) -> Result<String, DomainError> {
        Self::require(actor, Capability::CreateFlight)?;
        for (field, value) in [
            ("fieldLocation", &draft.field_location),
            ("productUsed", &draft.product_used),
            ("estimatedQuantity", &draft.estimated_quantity),
            ("estimatedTime", &draft.estimated_time),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("{} is required", field)));
            }
        }

        let now = Utc::now().to_rfc3339();
        let id = self
            .flights
            .create(json!({
                "operatorId": actor.uid,
                "farmerId": draft.farmer_id,
                "status": "scheduled",
                "scheduledDate": draft.scheduled_date.to_string(),
                "fieldLocation": draft.field_location,
                "productUsed": draft.product_used,
                "estimatedQuantity": draft.estimated_quantity,
                "estimatedTime": draft.estimated_time,
                "createdAt": now,
                "updatedAt": now,
            }))
            .await?;
        Ok(id)
    }

    /// Submit the fumigation for a scheduled flight, completing it.
    ///
    /// Two writes with no store-side atomicity: the fumigation record goes
    /// first, then the flight status patch. A failure between the writes
    /// leaves the flight still `scheduled` with the fumigation possibly
    /// recorded, which is recoverable; the reverse order could mark a
    /// flight completed with no record, which is not.
    pub async fn complete_flight(
        &self,
        actor: &SessionContext,
        flight_id: &str,
        report: FumigationReport,
    ) -> Result<String, DomainError> {
        Self::require(actor, Capability::CompleteFlight)?;
        if report.product_used.trim().is_empty() {
            return Err(DomainError::Validation("productUsed is required".to_string()));
        }
        if report.actual_quantity_applied.trim().is_empty() {
            return Err(DomainError::Validation(
                "actualQuantityApplied is required".to_string(),
            ));
        }

        let flight = self.flights.get(flight_id).await?;
        if flight.operator_id != actor.uid {
            return Err(DomainError::NotOwner {
                flight_id: flight_id.to_string(),
                operator_id: actor.uid.clone(),
            });
        }
        if flight.status != FlightStatus::Scheduled {
            return Err(DomainError::AlreadyCompleted {
                flight_id: flight_id.to_string(),
            });
        }

        let now = Utc::now().to_rfc3339();
        let fumigation_id = self
            .fumigations
            .create(json!({
                "flightId": flight_id,
                "operatorId": actor.uid,
                "fumigationDate": report.fumigation_date.to_string(),
                "productUsed": report.product_used,
                "actualQuantityApplied": report.actual_quantity_applied,
                "weatherConditions": report.weather_conditions,
                "notes": report.notes,
                "createdAt": now,
            }))
            .await?;

        if let Err(e) = self.flights.mark_completed(flight_id, &now).await {
            // The fumigation exists but the flight is still scheduled; the
            // next completion attempt will find it scheduled and may write
            // a second record. Known limitation of the two-write design.
            warn!(
                "flight {} left scheduled after fumigation {} was recorded: {}",
                flight_id, fumigation_id, e
            );
            return Err(e.into());
        }
        Ok(fumigation_id)
    }

    /// Submit a service request on behalf of the acting farmer.
    pub async fn submit_service_request(
        &self,
        actor: &SessionContext,
        draft: ServiceRequestDraft,
    ) -> Result<String, DomainError> {
        Self::require(actor, Capability::CreateServiceRequest)?;
        if draft.location_details.trim().is_empty() {
            return Err(DomainError::Validation(
                "locationDetails is required".to_string(),
            ));
        }

        let id = self
            .requests
            .create(json!({
                "farmerId": actor.uid,
                "farmerEmail": actor.email,
                "serviceType": draft.service_type,
                "locationDetails": draft.location_details,
                "preferredDate": draft.preferred_date.map(|d| d.to_string()),
                "notes": draft.notes,
                "requestDate": Utc::now().to_rfc3339(),
                "status": "pending",
            }))
            .await?;
        Ok(id)
    }

    /// Reassign a user's role. Any role may become any role; the only
    /// constraint is on the actor.
    pub async fn assign_role(
        &self,
        actor: &SessionContext,
        target_uid: &str,
        role: Role,
    ) -> Result<(), DomainError> {
        Self::require(actor, Capability::AssignRole)?;
        self.users.set_role(target_uid, role.as_str()).await?;
        Ok(())
    }

    /// The acting operator's flights, newest first.
    pub async fn my_flights(&self, actor: &SessionContext) -> Result<Vec<Flight>, DomainError> {
        Self::require(actor, Capability::ViewOwnFlights)?;
        Ok(self.flights.by_operator(&actor.uid).await?)
    }

    /// Live view of the acting operator's flights. The caller owns the
    /// subscription and must release it when the view goes away.
    pub async fn watch_my_flights(
        &self,
        actor: &SessionContext,
    ) -> Result<Subscription, DomainError> {
        Self::require(actor, Capability::ViewOwnFlights)?;
        Ok(self.flights.watch_by_operator(&actor.uid).await?)
    }

    /// Fumigations performed on the acting farmer's completed flights.
    pub async fn my_fumigations(
        &self,
        actor: &SessionContext,
    ) -> Result<Vec<Fumigation>, DomainError> {
        Self::require(actor, Capability::ViewOwnFumigations)?;
        let flights = self.flights.completed_for_farmer(&actor.uid).await?;
        let ids: Vec<String> = flights.into_iter().map(|f| f.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.fumigations.by_flight_ids(&ids).await?)
    }

    /// The acting farmer's own service requests, newest first.
    pub async fn my_service_requests(
        &self,
        actor: &SessionContext,
    ) -> Result<Vec<ServiceRequest>, DomainError> {
        Self::require(actor, Capability::CreateServiceRequest)?;
        Ok(self.requests.by_farmer(&actor.uid).await?)
    }

    /// Every user profile, for the admin listing.
    pub async fn list_users(&self, actor: &SessionContext) -> Result<Vec<UserProfile>, DomainError> {
        Self::require(actor, Capability::ListUsers)?;
        Ok(self.users.list().await?)
    }

    /// Every flight across operators, for the admin listing.
    pub async fn list_all_flights(
        &self,
        actor: &SessionContext,
    ) -> Result<Vec<Flight>, DomainError> {
        Self::require(actor, Capability::ListAllFlights)?;
        Ok(self.flights.list_all().await?)
    }

    /// Aggregate platform counts for the admin dashboard.
    pub async fn statistics(&self, actor: &SessionContext) -> Result<PlatformStats, DomainError> {
        Self::require(actor, Capability::ViewStatistics)?;
        let total_users = self.users.count().await?;
        let total_flights = self.flights.count().await?;
        let total_service_requests = self.requests.count().await?;
        // Counted client-side; the provider has no aggregate beyond count.
        let all_flights = self.flights.list_all().await?;
        Ok(PlatformStats {
            total_users,
            total_flights,
            total_service_requests,
            flights_with_product: flights_with_product(&all_flights),
        })
    }
}
