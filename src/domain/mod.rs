//! # Domain Layer
//!
//! The domain layer contains the core business logic of the booking service.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Tour, TravelRequest)
//! - **events**: Request events published to administrators
//! - **services**: Pure domain rules (availability, status transitions)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod events;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use events::*;
