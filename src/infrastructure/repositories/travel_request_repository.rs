//! Travel Request Repository Implementation
//!
//! PostgreSQL implementation of the TravelRequestRepository trait.
//!
//! A transition runs in one transaction:
//! 1. compare-and-set the request status (`WHERE status = <observed>`),
//!    which also row-locks the request;
//! 2. apply the inventory effect with a conditional update on the tour
//!    (`available_spots > 0` to reserve, capped at `max_participants` on release).
//!
//! Either statement matching no row rolls the whole transition back, so two
//! concurrent approvals can never drive `available_spots` below zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    GuestContact, InventoryEffect, RequestStatus, Requester, StatusTransition, TransitionOutcome,
    TravelRequest, TravelRequestRepository,
};
use crate::infrastructure::database::TransactionContext;
use crate::shared::error::AppError;

/// Database row representation of the travel_requests table.
#[derive(Debug, sqlx::FromRow)]
struct TravelRequestRow {
    id: i64,
    tour_id: i64,
    user_id: Option<i64>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
    comment: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TravelRequestRow {
    /// Convert database row to domain entity.
    fn into_request(self) -> Result<TravelRequest, AppError> {
        let requester = match (self.user_id, self.guest_name, self.guest_email, self.guest_phone) {
            (Some(user_id), None, None, None) => Requester::Registered { user_id },
            (None, Some(name), Some(email), Some(phone)) => {
                Requester::Guest(GuestContact { name, email, phone })
            }
            _ => {
                return Err(AppError::Internal(format!(
                    "travel request {} has an inconsistent requester",
                    self.id
                )))
            }
        };
        let status = self
            .status
            .parse::<RequestStatus>()
            .map_err(|e| AppError::Internal(format!("travel request {}: {}", self.id, e)))?;

        Ok(TravelRequest {
            id: self.id,
            tour_id: self.tour_id,
            requester,
            comment: self.comment,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, tour_id, user_id, guest_name, guest_email, guest_phone, \
     comment, status, created_at, updated_at";

/// PostgreSQL travel request repository implementation.
#[derive(Clone)]
pub struct PgTravelRequestRepository {
    pool: PgPool,
}

impl PgTravelRequestRepository {
    /// Create a new PgTravelRequestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(conn: &mut PgConnection, table: &str, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"
        ))
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Apply the inventory effect inside `ctx`. Returns `false` when no row matched.
    async fn apply_inventory(
        ctx: &mut TransactionContext,
        tour_id: i64,
        effect: InventoryEffect,
    ) -> Result<bool, AppError> {
        let sql = match effect {
            InventoryEffect::None => return Ok(true),
            InventoryEffect::Reserve => {
                "UPDATE tours SET available_spots = available_spots - 1 \
                 WHERE id = $1 AND available_spots > 0"
            }
            InventoryEffect::Release => {
                "UPDATE tours SET available_spots = LEAST(available_spots + 1, max_participants) \
                 WHERE id = $1"
            }
        };
        let result = sqlx::query(sql).bind(tour_id).execute(ctx.conn()).await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TravelRequestRepository for PgTravelRequestRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<TravelRequest>, AppError> {
        let row = sqlx::query_as::<_, TravelRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM travel_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TravelRequestRow::into_request).transpose()
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<TravelRequest>, AppError> {
        let rows = sqlx::query_as::<_, TravelRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM travel_requests WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TravelRequestRow::into_request).collect()
    }

    async fn list(&self) -> Result<Vec<TravelRequest>, AppError> {
        let rows = sqlx::query_as::<_, TravelRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM travel_requests ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TravelRequestRow::into_request).collect()
    }

    async fn create(&self, request: &TravelRequest) -> Result<TravelRequest, AppError> {
        let guest = request.requester.guest();
        let row = sqlx::query_as::<_, TravelRequestRow>(&format!(
            r#"
            INSERT INTO travel_requests (id, tour_id, user_id, guest_name, guest_email, guest_phone,
                                         comment, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.tour_id)
        .bind(request.requester.user_id())
        .bind(guest.map(|g| g.name.as_str()))
        .bind(guest.map(|g| g.email.as_str()))
        .bind(guest.map(|g| g.phone.as_str()))
        .bind(&request.comment)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Tour or user not found".into())
            }
            _ => AppError::Database(e),
        })?;

        row.into_request()
    }

    async fn apply_transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<TransitionOutcome, AppError> {
        let mut ctx = TransactionContext::begin(&self.pool).await?;

        let updated = sqlx::query_as::<_, TravelRequestRow>(&format!(
            r#"
            UPDATE travel_requests
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(transition.request_id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .fetch_optional(ctx.conn())
        .await?;

        let Some(row) = updated else {
            let exists =
                Self::exists(ctx.conn(), "travel_requests", transition.request_id).await?;
            ctx.rollback().await?;
            return Ok(if exists {
                TransitionOutcome::StatusChanged
            } else {
                TransitionOutcome::NotFound
            });
        };

        if !Self::apply_inventory(&mut ctx, transition.tour_id, transition.inventory).await? {
            let tour_exists = Self::exists(ctx.conn(), "tours", transition.tour_id).await?;
            ctx.rollback().await?;
            return Ok(if tour_exists {
                TransitionOutcome::NoCapacity
            } else {
                TransitionOutcome::NotFound
            });
        }

        ctx.commit().await?;
        Ok(TransitionOutcome::Applied(row.into_request()?))
    }
}
