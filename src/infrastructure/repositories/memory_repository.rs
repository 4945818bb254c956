//! In-memory repository implementation.
//!
//! Backs the `memory` storage backend and the test suite. All three
//! repositories share one lock, so a transition's status change and its
//! inventory update are observed together or not at all.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{
    InventoryEffect, StatusTransition, Tour, TourRepository, TransitionOutcome, TravelRequest,
    TravelRequestRepository, User, UserRepository,
};
use crate::shared::error::AppError;

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    tours: BTreeMap<i64, Tour>,
    requests: BTreeMap<i64, TravelRequest>,
}

/// Process-local store implementing every repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut requests: Vec<TravelRequest>) -> Vec<TravelRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    requests
}

fn by_creation(mut tours: Vec<Tour>) -> Vec<Tour> {
    tours.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    tours
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut state = self.state.lock();
        if state
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::Conflict(
                "Username or email already registered".into(),
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().users.values().any(|u| u.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .any(|u| u.username == username))
    }
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError> {
        Ok(self.state.lock().tours.get(&id).cloned())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Tour>, AppError> {
        let tours = by_creation(self.state.lock().tours.values().cloned().collect());
        Ok(tours
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<Tour>, AppError> {
        let mut tours: Vec<Tour> = self.state.lock().tours.values().cloned().collect();
        tours.sort_by(|a, b| {
            b.available_spots
                .cmp(&a.available_spots)
                .then(a.id.cmp(&b.id))
        });
        tours.truncate(limit.max(0) as usize);
        Ok(tours)
    }

    async fn list_hot(&self) -> Result<Vec<Tour>, AppError> {
        let tours = self
            .state
            .lock()
            .tours
            .values()
            .filter(|t| t.is_hot)
            .cloned()
            .collect();
        Ok(by_creation(tours))
    }

    async fn create(&self, tour: &Tour) -> Result<Tour, AppError> {
        tour.check_invariants().map_err(AppError::Validation)?;
        self.state.lock().tours.insert(tour.id, tour.clone());
        Ok(tour.clone())
    }

    async fn update(&self, tour: &Tour, available_spots: Option<i32>) -> Result<Tour, AppError> {
        let mut state = self.state.lock();
        let stored = state
            .tours
            .get_mut(&tour.id)
            .ok_or_else(|| AppError::NotFound(format!("Tour with id {} not found", tour.id)))?;
        let updated = Tour {
            available_spots: available_spots
                .unwrap_or_else(|| stored.available_spots.min(tour.max_participants)),
            created_at: stored.created_at,
            ..tour.clone()
        };
        updated.check_invariants().map_err(AppError::Validation)?;
        *stored = updated;
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock();
        if !state.tours.contains_key(&id) {
            return Err(AppError::NotFound(format!("Tour with id {} not found", id)));
        }
        if state.requests.values().any(|r| r.tour_id == id) {
            return Err(AppError::Conflict(
                "Tour has travel requests and cannot be deleted".into(),
            ));
        }
        state.tours.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TravelRequestRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<TravelRequest>, AppError> {
        Ok(self.state.lock().requests.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<TravelRequest>, AppError> {
        let requests = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.is_owned_by(user_id))
            .cloned()
            .collect();
        Ok(newest_first(requests))
    }

    async fn list(&self) -> Result<Vec<TravelRequest>, AppError> {
        let requests = self.state.lock().requests.values().cloned().collect();
        Ok(newest_first(requests))
    }

    async fn create(&self, request: &TravelRequest) -> Result<TravelRequest, AppError> {
        let mut state = self.state.lock();
        if !state.tours.contains_key(&request.tour_id) {
            return Err(AppError::NotFound("Tour or user not found".into()));
        }
        if let Some(user_id) = request.requester.user_id() {
            if !state.users.contains_key(&user_id) {
                return Err(AppError::NotFound("Tour or user not found".into()));
            }
        }
        state.requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn apply_transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<TransitionOutcome, AppError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(request) = state.requests.get_mut(&transition.request_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if request.status != transition.from {
            return Ok(TransitionOutcome::StatusChanged);
        }
        let Some(tour) = state.tours.get_mut(&transition.tour_id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        match transition.inventory {
            InventoryEffect::None => {}
            InventoryEffect::Reserve => {
                if tour.available_spots <= 0 {
                    return Ok(TransitionOutcome::NoCapacity);
                }
                tour.available_spots -= 1;
            }
            InventoryEffect::Release => {
                tour.available_spots = (tour.available_spots + 1).min(tour.max_participants);
            }
        }

        request.status = transition.to;
        request.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(request.clone()))
    }
}
