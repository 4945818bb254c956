//! Tour entity and repository trait.
//!
//! Maps to the `tours` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A bookable travel package.
///
/// Maps to the `tours` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - title: VARCHAR(200) NOT NULL
/// - description: TEXT NOT NULL
/// - location: VARCHAR(200) NOT NULL
/// - price: DOUBLE PRECISION NOT NULL
/// - duration: INTEGER NOT NULL (days)
/// - image_url: TEXT NULL
/// - rating: DOUBLE PRECISION NOT NULL DEFAULT 0
/// - max_participants: INTEGER NOT NULL
/// - available_spots: INTEGER NOT NULL, CHECK (0 <= available_spots <= max_participants)
/// - is_hot: BOOLEAN NOT NULL DEFAULT FALSE
/// - departure_date / return_date: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub duration: i32,
    pub image_url: Option<String>,
    pub rating: f64,

    /// Total capacity
    pub max_participants: i32,

    /// Remaining bookable capacity
    pub available_spots: i32,

    /// Featured as a last-minute offer
    pub is_hot: bool,

    pub departure_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    /// Whether a new travel request may be submitted against this tour.
    pub fn can_request(&self) -> bool {
        self.available_spots > 0
    }

    /// Check `0 <= available_spots <= max_participants` and date ordering.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.max_participants < 0 {
            return Err("max_participants must not be negative".into());
        }
        if self.available_spots < 0 {
            return Err("available_spots must not be negative".into());
        }
        if self.available_spots > self.max_participants {
            return Err("available_spots must not exceed max_participants".into());
        }
        if let (Some(departure), Some(ret)) = (self.departure_date, self.return_date) {
            if ret < departure {
                return Err("return_date must not be before departure_date".into());
            }
        }
        Ok(())
    }
}

impl Default for Tour {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            description: String::new(),
            location: String::new(),
            price: 0.0,
            duration: 1,
            image_url: None,
            rating: 0.0,
            max_participants: 0,
            available_spots: 0,
            is_hot: false,
            departure_date: None,
            return_date: None,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for Tour data access operations.
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// Find a tour by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError>;

    /// List tours ordered by creation time.
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Tour>, AppError>;

    /// Tours with the most remaining spots first.
    async fn list_popular(&self, limit: i64) -> Result<Vec<Tour>, AppError>;

    /// Tours flagged as hot offers.
    async fn list_hot(&self) -> Result<Vec<Tour>, AppError>;

    /// Create a new tour.
    async fn create(&self, tour: &Tour) -> Result<Tour, AppError>;

    /// Replace the editable fields of an existing tour.
    ///
    /// `available_spots` overwrites the remaining capacity when given.
    /// Otherwise the stored value is kept, clamped to the new
    /// `max_participants` in the same write, so a concurrent approval is
    /// never undone.
    async fn update(&self, tour: &Tour, available_spots: Option<i32>) -> Result<Tour, AppError>;

    /// Delete a tour. Fails with `Conflict` while travel requests reference it.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
