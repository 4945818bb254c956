//! Travel Request Service
//!
//! Request submission, request queries and the administrator status
//! workflow. Every status change is planned against the status read from
//! storage and applied by the repository as a single compare-and-set; a lost
//! race is re-read and re-planned a bounded number of times.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::services::plan_transition;
use crate::domain::{
    Actor, EventPublisher, GuestContact, RequestEvent, RequestEventKind, RequestStatus,
    Requester, RequesterIdentity, TourRepository, TransitionOutcome, TravelRequest,
    TravelRequestRepository, UserRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Re-plans after a concurrent status change before giving up with `Conflict`.
pub const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Travel request service trait
#[async_trait]
pub trait TravelRequestService: Send + Sync {
    /// Submit a request as a registered user
    async fn create_request(
        &self,
        actor: Actor,
        tour_id: i64,
        comment: Option<String>,
    ) -> Result<TravelRequest, TravelRequestError>;

    /// Submit a request without an account
    async fn create_guest_request(
        &self,
        tour_id: i64,
        guest: GuestContact,
        comment: Option<String>,
    ) -> Result<TravelRequest, TravelRequestError>;

    /// Requests submitted by `actor`, newest first
    async fn my_requests(&self, actor: Actor) -> Result<Vec<TravelRequest>, TravelRequestError>;

    /// Every request, newest first (administrators only)
    async fn all_requests(&self, actor: Actor)
        -> Result<Vec<TravelRequest>, TravelRequestError>;

    /// A single request; non-administrators only see their own
    async fn get_request(
        &self,
        actor: Actor,
        request_id: i64,
    ) -> Result<TravelRequest, TravelRequestError>;

    /// Move a request to `new_status` (administrators only)
    async fn transition(
        &self,
        actor: Actor,
        request_id: i64,
        new_status: &str,
    ) -> Result<TravelRequest, TravelRequestError>;
}

/// Travel request errors
#[derive(Debug, thiserror::Error)]
pub enum TravelRequestError {
    #[error("Travel request not found")]
    NotFound,

    #[error("Tour not found")]
    TourNotFound,

    #[error("Administrator privileges required")]
    Forbidden,

    #[error("Invalid status {0:?}; expected one of pending, approved, rejected, cancelled")]
    InvalidStatus(String),

    #[error("No available spots left on this tour")]
    NoCapacity,

    #[error("Request was modified concurrently, please retry")]
    Conflict,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for TravelRequestError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::NotFound(_) => TravelRequestError::TourNotFound,
            other => TravelRequestError::Internal(other.to_string()),
        }
    }
}

impl From<TravelRequestError> for AppError {
    fn from(e: TravelRequestError) -> Self {
        match e {
            TravelRequestError::NotFound | TravelRequestError::TourNotFound => {
                AppError::NotFound(e.to_string())
            }
            TravelRequestError::Forbidden => AppError::Forbidden(e.to_string()),
            TravelRequestError::InvalidStatus(_) => AppError::Validation(e.to_string()),
            TravelRequestError::NoCapacity => AppError::NoCapacity(e.to_string()),
            TravelRequestError::Conflict => AppError::Conflict(e.to_string()),
            TravelRequestError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// TravelRequestService implementation
pub struct TravelRequestServiceImpl<R, T, U>
where
    R: TravelRequestRepository + ?Sized,
    T: TourRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    request_repo: Arc<R>,
    tour_repo: Arc<T>,
    user_repo: Arc<U>,
    publisher: Arc<dyn EventPublisher>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<R, T, U> TravelRequestServiceImpl<R, T, U>
where
    R: TravelRequestRepository + ?Sized,
    T: TourRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    pub fn new(
        request_repo: Arc<R>,
        tour_repo: Arc<T>,
        user_repo: Arc<U>,
        publisher: Arc<dyn EventPublisher>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            request_repo,
            tour_repo,
            user_repo,
            publisher,
            id_generator,
        }
    }

    async fn submit(
        &self,
        tour_id: i64,
        requester: Requester,
        comment: Option<String>,
    ) -> Result<TravelRequest, TravelRequestError> {
        let tour = self
            .tour_repo
            .find_by_id(tour_id)
            .await?
            .ok_or(TravelRequestError::TourNotFound)?;
        if !tour.can_request() {
            return Err(TravelRequestError::NoCapacity);
        }

        let request = TravelRequest::new(
            self.id_generator.generate(),
            tour.id,
            requester,
            normalize_comment(comment),
        );
        let request = self.request_repo.create(&request).await?;

        tracing::info!(
            request_id = request.id,
            tour_id = tour.id,
            guest = request.requester.guest().is_some(),
            "Travel request created"
        );
        self.notify(RequestEventKind::Created, &request, Some(tour.title))
            .await;
        Ok(request)
    }

    /// Queue an event for administrators. Lookup failures degrade the
    /// message instead of failing the caller.
    async fn notify(
        &self,
        kind: RequestEventKind,
        request: &TravelRequest,
        tour_title: Option<String>,
    ) {
        let tour_title = match tour_title {
            Some(title) => title,
            None => match self.tour_repo.find_by_id(request.tour_id).await {
                Ok(Some(tour)) => tour.title,
                _ => format!("tour #{}", request.tour_id),
            },
        };
        let username = match request.requester.user_id() {
            Some(user_id) => match self.user_repo.find_by_id(user_id).await {
                Ok(user) => user.map(|u| u.username),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Could not resolve requester name");
                    None
                }
            },
            None => None,
        };

        let requester = RequesterIdentity::from_requester(&request.requester, username);
        self.publisher
            .publish(RequestEvent::new(kind, request, tour_title, requester));
    }
}

#[async_trait]
impl<R, T, U> TravelRequestService for TravelRequestServiceImpl<R, T, U>
where
    R: TravelRequestRepository + ?Sized + 'static,
    T: TourRepository + ?Sized + 'static,
    U: UserRepository + ?Sized + 'static,
{
    async fn create_request(
        &self,
        actor: Actor,
        tour_id: i64,
        comment: Option<String>,
    ) -> Result<TravelRequest, TravelRequestError> {
        self.submit(
            tour_id,
            Requester::Registered {
                user_id: actor.user_id,
            },
            comment,
        )
        .await
    }

    async fn create_guest_request(
        &self,
        tour_id: i64,
        guest: GuestContact,
        comment: Option<String>,
    ) -> Result<TravelRequest, TravelRequestError> {
        let guest = GuestContact {
            name: guest.name.trim().to_string(),
            email: guest.email.trim().to_string(),
            phone: guest.phone.trim().to_string(),
        };
        self.submit(tour_id, Requester::Guest(guest), comment).await
    }

    async fn my_requests(&self, actor: Actor) -> Result<Vec<TravelRequest>, TravelRequestError> {
        Ok(self.request_repo.find_by_user(actor.user_id).await?)
    }

    async fn all_requests(
        &self,
        actor: Actor,
    ) -> Result<Vec<TravelRequest>, TravelRequestError> {
        if !actor.is_admin {
            return Err(TravelRequestError::Forbidden);
        }
        Ok(self.request_repo.list().await?)
    }

    async fn get_request(
        &self,
        actor: Actor,
        request_id: i64,
    ) -> Result<TravelRequest, TravelRequestError> {
        self.request_repo
            .find_by_id(request_id)
            .await?
            .filter(|r| actor.is_admin || r.is_owned_by(actor.user_id))
            .ok_or(TravelRequestError::NotFound)
    }

    async fn transition(
        &self,
        actor: Actor,
        request_id: i64,
        new_status: &str,
    ) -> Result<TravelRequest, TravelRequestError> {
        if !actor.is_admin {
            metrics::record_transition("unknown", "forbidden");
            return Err(TravelRequestError::Forbidden);
        }
        let to: RequestStatus = new_status.parse().map_err(|_| {
            metrics::record_transition("unknown", "invalid_status");
            TravelRequestError::InvalidStatus(new_status.to_string())
        })?;

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self
                .request_repo
                .find_by_id(request_id)
                .await?
                .ok_or_else(|| {
                    metrics::record_transition(to.as_str(), "not_found");
                    TravelRequestError::NotFound
                })?;
            let plan = plan_transition(&current, to);

            match self.request_repo.apply_transition(&plan).await? {
                TransitionOutcome::Applied(updated) => {
                    metrics::record_transition(to.as_str(), "applied");
                    tracing::info!(
                        request_id,
                        tour_id = updated.tour_id,
                        from = %plan.from,
                        to = %plan.to,
                        inventory = ?plan.inventory,
                        admin_id = actor.user_id,
                        "Travel request status changed"
                    );
                    self.notify(RequestEventKind::StatusChanged, &updated, None)
                        .await;
                    return Ok(updated);
                }
                TransitionOutcome::NoCapacity => {
                    metrics::record_transition(to.as_str(), "no_capacity");
                    tracing::info!(request_id, tour_id = plan.tour_id, "Approval refused, tour is full");
                    return Err(TravelRequestError::NoCapacity);
                }
                TransitionOutcome::NotFound => {
                    metrics::record_transition(to.as_str(), "not_found");
                    return Err(TravelRequestError::NotFound);
                }
                TransitionOutcome::StatusChanged => {
                    tracing::debug!(request_id, attempt, "Status changed concurrently, re-planning");
                }
            }
        }

        metrics::record_transition(to.as_str(), "conflict");
        tracing::warn!(request_id, "Giving up on status change after repeated conflicts");
        Err(TravelRequestError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::domain::{Tour, User};
    use crate::infrastructure::repositories::MemoryStore;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const ADMIN: Actor = Actor {
        user_id: 1,
        is_admin: true,
    };
    const ANNA: Actor = Actor {
        user_id: 2,
        is_admin: false,
    };

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<RequestEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: RequestEvent) {
            self.events.lock().push(event);
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        events: Arc<RecordingPublisher>,
        service: TravelRequestServiceImpl<MemoryStore, MemoryStore, MemoryStore>,
    }

    impl Fixture {
        async fn new(spots: i32) -> Self {
            let store = Arc::new(MemoryStore::new());
            for (id, username, is_admin) in [(1, "admin", true), (2, "anna", false), (3, "boris", false)] {
                UserRepository::create(
                    store.as_ref(),
                    &User {
                        id,
                        username: username.into(),
                        email: format!("{username}@example.com"),
                        is_admin,
                        ..User::default()
                    },
                )
                .await
                .unwrap();
            }
            TourRepository::create(
                store.as_ref(),
                &Tour {
                    id: 10,
                    title: "Altai rafting".into(),
                    max_participants: spots,
                    available_spots: spots,
                    ..Tour::default()
                },
            )
            .await
            .unwrap();

            let events = Arc::new(RecordingPublisher::default());
            let service = TravelRequestServiceImpl::new(
                store.clone(),
                store.clone(),
                store.clone(),
                events.clone(),
                Arc::new(SnowflakeGenerator::default()),
            );
            Self {
                store,
                events,
                service,
            }
        }

        async fn spots(&self) -> i32 {
            TourRepository::find_by_id(self.store.as_ref(), 10)
                .await
                .unwrap()
                .unwrap()
                .available_spots
        }

        fn events(&self) -> Vec<RequestEvent> {
            self.events.events.lock().clone()
        }
    }

    #[tokio::test]
    async fn test_create_request_emits_created_event() {
        let fx = Fixture::new(2).await;
        let request = fx
            .service
            .create_request(ANNA, 10, Some("  window seat  ".into()))
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.comment.as_deref(), Some("window seat"));
        assert!(request.is_owned_by(ANNA.user_id));

        let events = fx.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RequestEventKind::Created);
        assert_eq!(events[0].tour_title, "Altai rafting");
        assert_eq!(
            events[0].requester,
            RequesterIdentity::User {
                user_id: 2,
                username: "anna".into()
            }
        );
    }

    #[tokio::test]
    async fn test_guest_request_has_no_user() {
        let fx = Fixture::new(2).await;
        let request = fx
            .service
            .create_guest_request(
                10,
                GuestContact {
                    name: "Ivan".into(),
                    email: "ivan@example.com".into(),
                    phone: "+7 999 123 45 67".into(),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(request.requester.user_id(), None);
        let guest = request.requester.guest().unwrap();
        assert_eq!(guest.name, "Ivan");
        assert_eq!(guest.email, "ivan@example.com");
        assert_eq!(guest.phone, "+7 999 123 45 67");
    }

    #[tokio::test]
    async fn test_create_against_full_tour_is_refused() {
        let fx = Fixture::new(0).await;
        assert!(matches!(
            fx.service.create_request(ANNA, 10, None).await,
            Err(TravelRequestError::NoCapacity)
        ));
        assert!(matches!(
            fx.service.create_request(ANNA, 11, None).await,
            Err(TravelRequestError::TourNotFound)
        ));
        assert!(fx.events().is_empty());
    }

    #[test_case("pending")]
    #[test_case("approved")]
    #[test_case("rejected")]
    #[test_case("cancelled")]
    #[test_case("bogus")]
    #[tokio::test]
    async fn test_non_admin_transition_is_forbidden(status: &str) {
        let fx = Fixture::new(2).await;
        let request = fx.service.create_request(ANNA, 10, None).await.unwrap();

        assert!(matches!(
            fx.service.transition(ANNA, request.id, status).await,
            Err(TravelRequestError::Forbidden)
        ));
        // Forbidden wins over a missing request too.
        assert!(matches!(
            fx.service.transition(ANNA, 999, status).await,
            Err(TravelRequestError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_request_unchanged() {
        let fx = Fixture::new(2).await;
        let request = fx.service.create_request(ANNA, 10, None).await.unwrap();

        let err = fx
            .service
            .transition(ADMIN, request.id, "confirmed")
            .await
            .unwrap_err();
        assert!(matches!(err, TravelRequestError::InvalidStatus(s) if s == "confirmed"));
        assert!(matches!(
            fx.service.transition(ADMIN, request.id, "APPROVED").await,
            Err(TravelRequestError::InvalidStatus(_))
        ));

        let stored = fx.service.get_request(ADMIN, request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        assert_eq!(fx.spots().await, 2);
    }

    #[tokio::test]
    async fn test_approve_twice_decrements_once() {
        let fx = Fixture::new(2).await;
        let request = fx.service.create_request(ANNA, 10, None).await.unwrap();

        fx.service
            .transition(ADMIN, request.id, "approved")
            .await
            .unwrap();
        fx.service
            .transition(ADMIN, request.id, "approved")
            .await
            .unwrap();

        assert_eq!(fx.spots().await, 1);
    }

    #[tokio::test]
    async fn test_unapproval_restores_spot() {
        let fx = Fixture::new(1).await;
        let request = fx.service.create_request(ANNA, 10, None).await.unwrap();

        fx.service
            .transition(ADMIN, request.id, "approved")
            .await
            .unwrap();
        assert_eq!(fx.spots().await, 0);

        let cancelled = fx
            .service
            .transition(ADMIN, request.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(fx.spots().await, 1);

        let events = fx.events();
        assert_eq!(events.last().map(|e| e.kind), Some(RequestEventKind::StatusChanged));
        assert_eq!(events.last().map(|e| e.status), Some(RequestStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_approval_without_capacity_fails() {
        let fx = Fixture::new(1).await;
        let first = fx.service.create_request(ANNA, 10, None).await.unwrap();
        let second = fx
            .service
            .create_request(Actor { user_id: 3, is_admin: false }, 10, None)
            .await
            .unwrap();

        fx.service
            .transition(ADMIN, first.id, "approved")
            .await
            .unwrap();
        assert!(matches!(
            fx.service.transition(ADMIN, second.id, "approved").await,
            Err(TravelRequestError::NoCapacity)
        ));

        let stored = fx.service.get_request(ADMIN, second.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
        assert_eq!(fx.spots().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let fx = Fixture::new(1).await;
        assert!(matches!(
            fx.service.transition(ADMIN, 999, "approved").await,
            Err(TravelRequestError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_users_only_see_their_own_requests() {
        let fx = Fixture::new(3).await;
        let boris = Actor {
            user_id: 3,
            is_admin: false,
        };
        let annas = fx.service.create_request(ANNA, 10, None).await.unwrap();
        fx.service.create_request(boris, 10, None).await.unwrap();

        let mine = fx.service.my_requests(ANNA).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, annas.id);

        assert!(matches!(
            fx.service.get_request(boris, annas.id).await,
            Err(TravelRequestError::NotFound)
        ));
        assert!(matches!(
            fx.service.all_requests(ANNA).await,
            Err(TravelRequestError::Forbidden)
        ));
        assert_eq!(fx.service.all_requests(ADMIN).await.unwrap().len(), 2);
    }
}
