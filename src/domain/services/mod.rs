//! # Domain Services
//!
//! Pure business rules that don't naturally belong to a single entity.
//!
//! - **transitions**: planning a request status change and its effect on
//!   tour inventory

mod transitions;

pub use transitions::*;
