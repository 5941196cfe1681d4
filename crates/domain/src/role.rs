//! Role policy.
//!
//! A pure mapping from role to permitted capabilities. Every gate in the
//! workflow engine goes through [`Role::allows`] before any store call, so
//! an unauthorized action is rejected without touching the backend.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Operator,
    Admin,
}

/// Actions and views a role may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Register a new flight (operator becomes its owner).
    CreateFlight,
    /// Submit a fumigation for an owned scheduled flight, completing it.
    CompleteFlight,
    /// View the actor's own flights, live.
    ViewOwnFlights,
    /// Submit a service request.
    CreateServiceRequest,
    /// View fumigations performed on the actor's own completed flights.
    ViewOwnFumigations,
    /// Run the spray mix calculator.
    CalculateMix,
    /// List every user profile.
    ListUsers,
    /// List every flight across operators.
    ListAllFlights,
    /// View aggregate platform counts.
    ViewStatistics,
    /// Reassign any user's role.
    AssignRole,
}

impl Role {
    /// The full capability set of this role. No capability is granted
    /// outside this table.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Farmer => &[
                Capability::CreateServiceRequest,
                Capability::ViewOwnFumigations,
                Capability::CalculateMix,
            ],
            Role::Operator => &[
                Capability::CreateFlight,
                Capability::CompleteFlight,
                Capability::ViewOwnFlights,
                Capability::CalculateMix,
            ],
            Role::Admin => &[
                Capability::ListUsers,
                Capability::ListAllFlights,
                Capability::ViewStatistics,
                Capability::AssignRole,
                Capability::CalculateMix,
            ],
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Parse a role string as stored in profile documents.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "farmer" => Some(Role::Farmer),
            "operator" => Some(Role::Operator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Resolve a role string from the wire, falling back to `farmer` for
    /// unknown values. The fallback is deliberate: a profile with a
    /// malformed role degrades to the least-privileged role instead of
    /// locking the user out.
    pub fn from_wire(value: &str) -> Role {
        match Role::parse(value) {
            Some(role) => role,
            None => {
                warn!("unrecognized role {:?}, defaulting to farmer", value);
                Role::Farmer
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Operator => "operator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::CreateFlight => "create a flight",
            Capability::CompleteFlight => "complete a flight",
            Capability::ViewOwnFlights => "view own flights",
            Capability::CreateServiceRequest => "create a service request",
            Capability::ViewOwnFumigations => "view own fumigations",
            Capability::CalculateMix => "calculate a spray mix",
            Capability::ListUsers => "list users",
            Capability::ListAllFlights => "list all flights",
            Capability::ViewStatistics => "view statistics",
            Capability::AssignRole => "assign roles",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_actions_are_denied_to_other_roles() {
        for capability in [
            Capability::ListUsers,
            Capability::ListAllFlights,
            Capability::ViewStatistics,
            Capability::AssignRole,
        ] {
            assert!(Role::Admin.allows(capability));
            assert!(!Role::Farmer.allows(capability), "{:?}", capability);
            assert!(!Role::Operator.allows(capability), "{:?}", capability);
        }
    }

    #[test]
    fn operators_own_the_flight_lifecycle() {
        assert!(Role::Operator.allows(Capability::CreateFlight));
        assert!(Role::Operator.allows(Capability::CompleteFlight));
        assert!(!Role::Farmer.allows(Capability::CreateFlight));
        assert!(!Role::Admin.allows(Capability::CompleteFlight));
    }

    #[test]
    fn farmers_request_services_and_view_fumigations() {
        assert!(Role::Farmer.allows(Capability::CreateServiceRequest));
        assert!(Role::Farmer.allows(Capability::ViewOwnFumigations));
        assert!(!Role::Operator.allows(Capability::CreateServiceRequest));
    }

    #[test]
    fn every_role_may_use_the_mix_calculator() {
        for role in [Role::Farmer, Role::Operator, Role::Admin] {
            assert!(role.allows(Capability::CalculateMix));
        }
    }

    #[test]
    fn unknown_role_string_falls_back_to_farmer() {
        assert_eq!(Role::from_wire("pilot"), Role::Farmer);
        assert_eq!(Role::from_wire(""), Role::Farmer);
        assert_eq!(Role::from_wire("operator"), Role::Operator);
    }
}
