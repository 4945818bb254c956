//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: registration, login, JWT tokens, administrator bootstrap
//! - **TourService**: tour catalogue and administrator tour management
//! - **TravelRequestService**: request submission, queries and the status workflow

pub mod auth_service;
pub mod tour_service;
pub mod travel_request_service;

// Re-export auth service types
pub use auth_service::{
    claims_user_id, decode_access_token, AuthError, AuthService, AuthServiceImpl, AuthTokens,
    Claims,
};

// Re-export tour service types
pub use tour_service::{TourDraft, TourError, TourService, TourServiceImpl};

// Re-export travel request service types
pub use travel_request_service::{
    TravelRequestError, TravelRequestService, TravelRequestServiceImpl, MAX_TRANSITION_ATTEMPTS,
};
