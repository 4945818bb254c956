//! Repository Implementations
//!
//! Implementations of the domain repository traits.
//!
//! - **PgUserRepository** - user accounts
//! - **PgTourRepository** - tours and their remaining capacity
//! - **PgTravelRequestRepository** - travel requests and the atomic
//!   status + inventory transition
//! - **MemoryStore** - process-local implementation of all three, used by
//!   the `memory` storage backend and in tests
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{
//!     PgTourRepository, PgTravelRequestRepository, PgUserRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let tour_repo = PgTourRepository::new(pool.clone());
//!     let request_repo = PgTravelRequestRepository::new(pool);
//! }
//! ```

pub mod memory_repository;
pub mod tour_repository;
pub mod travel_request_repository;
pub mod user_repository;

pub use memory_repository::MemoryStore;
pub use tour_repository::PgTourRepository;
pub use travel_request_repository::PgTravelRequestRepository;
pub use user_repository::PgUserRepository;
