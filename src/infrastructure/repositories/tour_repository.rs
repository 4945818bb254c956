//! Tour Repository Implementation
//!
//! PostgreSQL implementation of the TourRepository trait.
//! `available_spots` is never written here except through a full admin
//! update; approvals go through the travel request repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Tour, TourRepository};
use crate::shared::error::AppError;

/// Database row representation of the tours table.
#[derive(Debug, sqlx::FromRow)]
struct TourRow {
    id: i64,
    title: String,
    description: String,
    location: String,
    price: f64,
    duration: i32,
    image_url: Option<String>,
    rating: f64,
    max_participants: i32,
    available_spots: i32,
    is_hot: bool,
    departure_date: Option<DateTime<Utc>>,
    return_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<TourRow> for Tour {
    fn from(row: TourRow) -> Self {
        Tour {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            price: row.price,
            duration: row.duration,
            image_url: row.image_url,
            rating: row.rating,
            max_participants: row.max_participants,
            available_spots: row.available_spots,
            is_hot: row.is_hot,
            departure_date: row.departure_date,
            return_date: row.return_date,
            created_at: row.created_at,
        }
    }
}

const TOUR_COLUMNS: &str = "id, title, description, location, price, duration, image_url, rating, \
     max_participants, available_spots, is_hot, departure_date, return_date, created_at";

/// PostgreSQL tour repository implementation.
#[derive(Clone)]
pub struct PgTourRepository {
    pool: PgPool,
}

impl PgTourRepository {
    /// Create a new PgTourRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_constraint_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            AppError::Validation("available_spots must be between 0 and max_participants".into())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError> {
        let row = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tour::from))
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Tour>, AppError> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours ORDER BY created_at, id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tour::from).collect())
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<Tour>, AppError> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours ORDER BY available_spots DESC, id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tour::from).collect())
    }

    async fn list_hot(&self) -> Result<Vec<Tour>, AppError> {
        let rows = sqlx::query_as::<_, TourRow>(&format!(
            "SELECT {TOUR_COLUMNS} FROM tours WHERE is_hot ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tour::from).collect())
    }

    async fn create(&self, tour: &Tour) -> Result<Tour, AppError> {
        let row = sqlx::query_as::<_, TourRow>(&format!(
            r#"
            INSERT INTO tours (id, title, description, location, price, duration, image_url,
                               rating, max_participants, available_spots, is_hot,
                               departure_date, return_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(tour.id)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(&tour.location)
        .bind(tour.price)
        .bind(tour.duration)
        .bind(&tour.image_url)
        .bind(tour.rating)
        .bind(tour.max_participants)
        .bind(tour.available_spots)
        .bind(tour.is_hot)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .bind(tour.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_error)?;

        Ok(row.into())
    }

    async fn update(&self, tour: &Tour, available_spots: Option<i32>) -> Result<Tour, AppError> {
        let row = sqlx::query_as::<_, TourRow>(&format!(
            r#"
            UPDATE tours
            SET title = $2,
                description = $3,
                location = $4,
                price = $5,
                duration = $6,
                image_url = $7,
                rating = $8,
                max_participants = $9,
                available_spots = COALESCE($10, LEAST(available_spots, $9)),
                is_hot = $11,
                departure_date = $12,
                return_date = $13
            WHERE id = $1
            RETURNING {TOUR_COLUMNS}
            "#
        ))
        .bind(tour.id)
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(&tour.location)
        .bind(tour.price)
        .bind(tour.duration)
        .bind(&tour.image_url)
        .bind(tour.rating)
        .bind(tour.max_participants)
        .bind(available_spots)
        .bind(tour.is_hot)
        .bind(tour.departure_date)
        .bind(tour.return_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint_error)?
        .ok_or_else(|| AppError::NotFound(format!("Tour with id {} not found", tour.id)))?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict("Tour has travel requests and cannot be deleted".into())
                }
                _ => AppError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tour with id {} not found", id)));
        }

        Ok(())
    }
}
