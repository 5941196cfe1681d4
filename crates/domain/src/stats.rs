//! Aggregate platform counts for the admin dashboard.

use serde::Serialize;

use crate::model::Flight;

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_flights: u64,
    pub total_service_requests: u64,
    /// Flights whose registration named a product.
    pub flights_with_product: u64,
}

/// Count flights carrying a non-empty product. The provider offers no
/// predicate aggregate, so this runs over the fetched flight list.
pub fn flights_with_product(flights: &[Flight]) -> u64 {
    flights
        .iter()
        .filter(|f| !f.product_used.trim().is_empty())
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlightStatus;
    use chrono::{NaiveDate, Utc};

    fn flight(id: &str, product: &str) -> Flight {
        Flight {
            id: id.to_string(),
            operator_id: "op-1".to_string(),
            farmer_id: None,
            status: FlightStatus::Scheduled,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            field_location: "Lote 1".to_string(),
            product_used: product.to_string(),
            estimated_quantity: "20L".to_string(),
            estimated_time: "1 hora".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn blank_products_are_not_counted() {
        let flights = vec![flight("a", "Glifosato"), flight("b", "  "), flight("c", "")];
        assert_eq!(flights_with_product(&flights), 1);
    }
}
