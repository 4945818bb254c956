//! Travel request entity and repository trait.
//!
//! Maps to the `travel_requests` table in the database schema.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Status of a travel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Returned when a string names no known [`RequestStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request status: {0:?}")]
pub struct UnknownStatus(pub String);

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Cancelled,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details left by a requester without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Who submitted a travel request: a registered user or a guest, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Requester {
    Registered { user_id: i64 },
    Guest(GuestContact),
}

impl Requester {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Registered { user_id } => Some(*user_id),
            Self::Guest(_) => None,
        }
    }

    pub fn guest(&self) -> Option<&GuestContact> {
        match self {
            Self::Registered { .. } => None,
            Self::Guest(contact) => Some(contact),
        }
    }
}

/// Represents a request to book a tour.
///
/// Maps to the `travel_requests` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - tour_id: BIGINT NOT NULL REFERENCES tours(id)
/// - user_id: BIGINT NULL REFERENCES users(id)
/// - guest_name / guest_email / guest_phone: NULL unless user_id is NULL
/// - comment: TEXT NULL
/// - status: VARCHAR(16) NOT NULL DEFAULT 'pending'
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub id: i64,
    pub tour_id: i64,
    pub requester: Requester,
    pub comment: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelRequest {
    /// A fresh `pending` request.
    pub fn new(id: i64, tour_id: i64, requester: Requester, comment: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            tour_id,
            requester,
            comment,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` submitted this request.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.requester.user_id() == Some(user_id)
    }
}

/// What a status change does to the tour's remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEffect {
    None,
    /// Take one spot; fails when none are left.
    Reserve,
    /// Give one spot back, never exceeding `max_participants`.
    Release,
}

/// A planned status change, applied atomically by the repository.
///
/// `from` is the status the planner observed; the repository applies the
/// change only if the stored status still equals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub request_id: i64,
    pub tour_id: i64,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub inventory: InventoryEffect,
}

/// Result of applying a [`StatusTransition`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(TravelRequest),
    /// The tour had no spot left to reserve; nothing was changed.
    NoCapacity,
    /// The stored status no longer matches `from`; nothing was changed.
    StatusChanged,
    /// The request or its tour does not exist.
    NotFound,
}

/// Repository trait for TravelRequest data access operations.
#[async_trait]
pub trait TravelRequestRepository: Send + Sync {
    /// Find a request by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<TravelRequest>, AppError>;

    /// Requests submitted by a registered user, newest first.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<TravelRequest>, AppError>;

    /// All requests, newest first.
    async fn list(&self) -> Result<Vec<TravelRequest>, AppError>;

    /// Store a new request.
    async fn create(&self, request: &TravelRequest) -> Result<TravelRequest, AppError>;

    /// Apply a status change and its inventory effect as one atomic unit.
    async fn apply_transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<TransitionOutcome, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("pending", RequestStatus::Pending)]
    #[test_case("approved", RequestStatus::Approved)]
    #[test_case("rejected", RequestStatus::Rejected)]
    #[test_case("cancelled", RequestStatus::Cancelled)]
    fn test_status_parses(input: &str, expected: RequestStatus) {
        assert_eq!(input.parse::<RequestStatus>(), Ok(expected));
    }

    #[test_case("confirmed")]
    #[test_case("")]
    #[test_case("approve")]
    #[test_case("APPROVED")]
    #[test_case(" rejected ")]
    fn test_unknown_status_is_rejected(input: &str) {
        assert_eq!(
            input.parse::<RequestStatus>(),
            Err(UnknownStatus(input.to_string()))
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&RequestStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        for status in RequestStatus::ALL {
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = TravelRequest::new(1, 2, Requester::Registered { user_id: 3 }, None);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.is_owned_by(3));
        assert!(!request.is_owned_by(4));
    }

    #[test]
    fn test_guest_requester_has_no_user() {
        let requester = Requester::Guest(GuestContact {
            name: "Ivan".into(),
            email: "ivan@example.com".into(),
            phone: "+7 999 123 45 67".into(),
        });
        assert_eq!(requester.user_id(), None);
        assert_eq!(requester.guest().map(|g| g.name.as_str()), Some("Ivan"));

        let request = TravelRequest::new(1, 2, requester, None);
        assert!(!request.is_owned_by(0));
    }
}
