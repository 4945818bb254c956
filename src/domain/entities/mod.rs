//! # Domain Entities
//!
//! Core domain entities representing the main business objects of the
//! booking service. All entities map directly to their database tables.
//!
//! - **User**: account with credentials and active/admin flags
//! - **Tour**: bookable travel package with finite capacity
//! - **TravelRequest**: a registered user's or a guest's request to book a tour
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer.

mod tour;
mod travel_request;
mod user;

pub use tour::{Tour, TourRepository};
pub use travel_request::{
    GuestContact, InventoryEffect, RequestStatus, Requester, StatusTransition, TransitionOutcome,
    TravelRequest, TravelRequestRepository, UnknownStatus,
};
pub use user::{Actor, User, UserRepository};
