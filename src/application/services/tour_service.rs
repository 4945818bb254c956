//! Tour Service
//!
//! Public tour catalogue queries and administrator tour management.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Actor, Tour, TourRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Largest page `list_tours` returns.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default number of popular tours.
pub const DEFAULT_POPULAR_LIMIT: i64 = 6;

/// Tour service trait
#[async_trait]
pub trait TourService: Send + Sync {
    /// Tours in creation order; `limit` is capped at [`MAX_PAGE_SIZE`]
    async fn list_tours(&self, skip: i64, limit: i64) -> Result<Vec<Tour>, TourError>;

    /// Tours with the most remaining spots first
    async fn popular_tours(&self, limit: Option<i64>) -> Result<Vec<Tour>, TourError>;

    /// Tours flagged as hot offers
    async fn hot_tours(&self) -> Result<Vec<Tour>, TourError>;

    async fn get_tour(&self, tour_id: i64) -> Result<Tour, TourError>;

    async fn create_tour(&self, actor: Actor, draft: TourDraft) -> Result<Tour, TourError>;

    async fn update_tour(
        &self,
        actor: Actor,
        tour_id: i64,
        draft: TourDraft,
    ) -> Result<Tour, TourError>;

    async fn delete_tour(&self, actor: Actor, tour_id: i64) -> Result<(), TourError>;
}

/// Tour fields supplied by an administrator
#[derive(Debug, Clone)]
pub struct TourDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub duration: i32,
    pub image_url: Option<String>,
    pub rating: f64,
    pub max_participants: i32,
    /// Defaults to `max_participants` on create; on update the stored value is
    /// kept, clamped to the new capacity
    pub available_spots: Option<i32>,
    pub is_hot: bool,
    pub departure_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
}

/// Tour service errors
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    #[error("Tour not found")]
    NotFound,

    #[error("Administrator privileges required")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for TourError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::NotFound(_) => TourError::NotFound,
            AppError::Validation(msg) => TourError::Validation(msg),
            AppError::Conflict(msg) => TourError::Conflict(msg),
            other => TourError::Internal(other.to_string()),
        }
    }
}

impl From<TourError> for AppError {
    fn from(e: TourError) -> Self {
        match e {
            TourError::NotFound => AppError::NotFound(e.to_string()),
            TourError::Forbidden => AppError::Forbidden(e.to_string()),
            TourError::Validation(msg) => AppError::Validation(msg),
            TourError::Conflict(msg) => AppError::Conflict(msg),
            TourError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// TourService implementation
pub struct TourServiceImpl<T>
where
    T: TourRepository + ?Sized,
{
    tour_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<T> TourServiceImpl<T>
where
    T: TourRepository + ?Sized,
{
    pub fn new(tour_repo: Arc<T>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            tour_repo,
            id_generator,
        }
    }

    fn require_admin(actor: Actor) -> Result<(), TourError> {
        if actor.is_admin {
            Ok(())
        } else {
            Err(TourError::Forbidden)
        }
    }

    fn build(id: i64, created_at: DateTime<Utc>, spots: i32, draft: TourDraft) -> Result<Tour, TourError> {
        let tour = Tour {
            id,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            price: draft.price,
            duration: draft.duration,
            image_url: draft.image_url,
            rating: draft.rating,
            max_participants: draft.max_participants,
            available_spots: spots,
            is_hot: draft.is_hot,
            departure_date: draft.departure_date,
            return_date: draft.return_date,
            created_at,
        };
        tour.check_invariants().map_err(TourError::Validation)?;
        Ok(tour)
    }
}

#[async_trait]
impl<T> TourService for TourServiceImpl<T>
where
    T: TourRepository + ?Sized + 'static,
{
    async fn list_tours(&self, skip: i64, limit: i64) -> Result<Vec<Tour>, TourError> {
        let skip = skip.max(0);
        let limit = limit.clamp(0, MAX_PAGE_SIZE);
        Ok(self.tour_repo.list(skip, limit).await?)
    }

    async fn popular_tours(&self, limit: Option<i64>) -> Result<Vec<Tour>, TourError> {
        let limit = limit
            .unwrap_or(DEFAULT_POPULAR_LIMIT)
            .clamp(0, MAX_PAGE_SIZE);
        Ok(self.tour_repo.list_popular(limit).await?)
    }

    async fn hot_tours(&self) -> Result<Vec<Tour>, TourError> {
        Ok(self.tour_repo.list_hot().await?)
    }

    async fn get_tour(&self, tour_id: i64) -> Result<Tour, TourError> {
        self.tour_repo
            .find_by_id(tour_id)
            .await?
            .ok_or(TourError::NotFound)
    }

    async fn create_tour(&self, actor: Actor, draft: TourDraft) -> Result<Tour, TourError> {
        Self::require_admin(actor)?;

        let spots = draft.available_spots.unwrap_or(draft.max_participants);
        let tour = Self::build(self.id_generator.generate(), Utc::now(), spots, draft)?;
        let tour = self.tour_repo.create(&tour).await?;

        tracing::info!(tour_id = tour.id, title = %tour.title, "Tour created");
        Ok(tour)
    }

    async fn update_tour(
        &self,
        actor: Actor,
        tour_id: i64,
        draft: TourDraft,
    ) -> Result<Tour, TourError> {
        Self::require_admin(actor)?;

        let current = self.get_tour(tour_id).await?;
        let requested = draft.available_spots;
        // Validated against the new capacity; the repository resolves the
        // stored count when none was requested.
        let spots = requested.unwrap_or(draft.max_participants);
        let tour = Self::build(tour_id, current.created_at, spots, draft)?;
        let tour = self.tour_repo.update(&tour, requested).await?;

        tracing::info!(tour_id, available_spots = tour.available_spots, "Tour updated");
        Ok(tour)
    }

    async fn delete_tour(&self, actor: Actor, tour_id: i64) -> Result<(), TourError> {
        Self::require_admin(actor)?;

        self.tour_repo.delete(tour_id).await?;
        tracing::info!(tour_id, "Tour deleted");
        Ok(())
    }
}
