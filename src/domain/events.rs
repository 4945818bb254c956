//! Request events published to administrators.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entities::{GuestContact, RequestStatus, Requester, TravelRequest};

/// What happened to a travel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestEventKind {
    Created,
    StatusChanged,
}

/// Human-readable identity of whoever submitted a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RequesterIdentity {
    User { user_id: i64, username: String },
    Guest(GuestContact),
}

impl RequesterIdentity {
    /// Resolve the identity of `requester`, given the username when registered.
    pub fn from_requester(requester: &Requester, username: Option<String>) -> Self {
        match requester {
            Requester::Registered { user_id } => Self::User {
                user_id: *user_id,
                username: username.unwrap_or_else(|| format!("user #{user_id}")),
            },
            Requester::Guest(contact) => Self::Guest(contact.clone()),
        }
    }
}

/// A notification-worthy change to a travel request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEvent {
    pub kind: RequestEventKind,
    pub request_id: i64,
    pub tour_title: String,
    pub status: RequestStatus,
    pub occurred_at: DateTime<Utc>,
    pub requester: RequesterIdentity,
    pub comment: Option<String>,
}

impl RequestEvent {
    pub fn new(
        kind: RequestEventKind,
        request: &TravelRequest,
        tour_title: impl Into<String>,
        requester: RequesterIdentity,
    ) -> Self {
        let occurred_at = match kind {
            RequestEventKind::Created => request.created_at,
            RequestEventKind::StatusChanged => request.updated_at,
        };
        Self {
            kind,
            request_id: request.id,
            tour_title: tour_title.into(),
            status: request.status,
            occurred_at,
            requester,
            comment: request.comment.clone(),
        }
    }
}

/// Sink for request events.
///
/// Publishing is fire-and-forget: it must return promptly and never report
/// delivery failures back to the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: RequestEvent);
}
