//! Entities stored in the provider collections.
//!
//! Field names on the wire are camelCase, matching the documents the
//! mobile clients read and write. Every entity is owned by the external
//! store; the structs here are transient, re-fetchable copies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Flight lifecycle. `Completed` is terminal; the only transition is
/// scheduled → completed, as a side effect of a fumigation submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Completed,
}

/// Service request lifecycle. `Pending` is currently the only state: no
/// approval or rejection transition exists anywhere in the system, so the
/// enum has a single variant until that workflow is actually designed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
}

/// A user's profile document, keyed by the identity provider uid.
///
/// `role` stays a string on the wire; it is resolved to a [`crate::Role`]
/// at session time so unknown values can take the explicit farmer
/// fallback instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A scheduled or completed drone operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,
    pub operator_id: String,
    #[serde(default)]
    pub farmer_id: Option<String>,
    pub status: FlightStatus,
    pub scheduled_date: NaiveDate,
    pub field_location: String,
    pub product_used: String,
    pub estimated_quantity: String,
    pub estimated_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operator input for registering a flight.
#[derive(Debug, Clone)]
pub struct FlightDraft {
    pub scheduled_date: NaiveDate,
    pub field_location: String,
    pub product_used: String,
    pub estimated_quantity: String,
    pub estimated_time: String,
    pub farmer_id: Option<String>,
}

/// The executed application tied to a completed flight. Write-once: no
/// edit or delete path exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fumigation {
    pub id: String,
    pub flight_id: String,
    pub operator_id: String,
    pub fumigation_date: NaiveDate,
    pub product_used: String,
    pub actual_quantity_applied: String,
    #[serde(default)]
    pub weather_conditions: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Operator input for logging a fumigation against a flight.
#[derive(Debug, Clone)]
pub struct FumigationReport {
    pub fumigation_date: NaiveDate,
    pub product_used: String,
    pub actual_quantity_applied: String,
    pub weather_conditions: Option<String>,
    pub notes: Option<String>,
}

/// A farmer-initiated request for service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub farmer_id: String,
    /// Denormalized so admin views need no profile lookup.
    #[serde(default)]
    pub farmer_email: Option<String>,
    pub service_type: String,
    pub location_details: String,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    pub request_date: DateTime<Utc>,
    pub status: RequestStatus,
}

/// Farmer input for submitting a service request.
#[derive(Debug, Clone)]
pub struct ServiceRequestDraft {
    pub service_type: String,
    pub location_details: String,
    pub preferred_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flight_deserializes_from_wire_document() {
        let doc = json!({
            "id": "f-1",
            "operatorId": "op-1",
            "status": "scheduled",
            "scheduledDate": "2026-09-01",
            "fieldLocation": "Finca La Esperanza, Lote 3",
            "productUsed": "Glifosato",
            "estimatedQuantity": "20L",
            "estimatedTime": "2 horas",
            "createdAt": "2026-08-20T10:00:00Z",
            "updatedAt": "2026-08-20T10:00:00Z"
        });
        let flight: Flight = serde_json::from_value(doc).unwrap();
        assert_eq!(flight.status, FlightStatus::Scheduled);
        assert_eq!(flight.farmer_id, None);
        assert_eq!(flight.scheduled_date.to_string(), "2026-09-01");
    }

    #[test]
    fn service_request_status_round_trips() {
        let request = ServiceRequest {
            id: "r-1".to_string(),
            farmer_id: "farmer-1".to_string(),
            farmer_email: Some("farmer@example.com".to_string()),
            service_type: "Fumigación con Dron".to_string(),
            location_details: "Lote 5".to_string(),
            preferred_date: None,
            notes: None,
            request_date: Utc::now(),
            status: RequestStatus::Pending,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["farmerEmail"], "farmer@example.com");
    }
}
