//! Domain core for the agrodrone coordination platform
//!
//! Everything the screens of a coordination client must agree on lives
//! here: the entities stored in the provider collections, the role policy
//! that gates every action, the workflow engine that applies policy and
//! entity state to decide legal transitions, and the repositories that
//! execute against the document store.

pub mod error;
pub mod mix;
pub mod model;
pub mod repo;
pub mod role;
pub mod session;
pub mod stats;
pub mod workflow;

pub use error::DomainError;
pub use mix::{calculate as calculate_mix, MixInput, MixPlan, Product, DEFAULT_WATER_PER_HECTARE};
pub use model::{
    Flight, FlightDraft, FlightStatus, Fumigation, FumigationReport, RequestStatus,
    ServiceRequest, ServiceRequestDraft, UserProfile,
};
pub use role::{Capability, Role};
pub use session::{SessionContext, SessionManager};
pub use stats::PlatformStats;
pub use workflow::WorkflowEngine;
