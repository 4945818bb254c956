//! Request status transition rules.
//!
//! Entering `approved` commits one unit of tour capacity; leaving it gives
//! the unit back. Every other change only touches the request itself.

use crate::domain::entities::{InventoryEffect, RequestStatus, StatusTransition, TravelRequest};

/// Inventory effect of moving a request from `from` to `to`.
pub fn inventory_effect(from: RequestStatus, to: RequestStatus) -> InventoryEffect {
    match (from, to) {
        (from, to) if from == to => InventoryEffect::None,
        (_, RequestStatus::Approved) => InventoryEffect::Reserve,
        (RequestStatus::Approved, _) => InventoryEffect::Release,
        _ => InventoryEffect::None,
    }
}

/// Plan the change of `request` to `to`, based on its current status.
pub fn plan_transition(request: &TravelRequest, to: RequestStatus) -> StatusTransition {
    StatusTransition {
        request_id: request.id,
        tour_id: request.tour_id,
        from: request.status,
        to,
        inventory: inventory_effect(request.status, to),
    }
}
