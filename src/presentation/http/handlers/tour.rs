//! Tour Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{PopularParams, TourListParams, TourPayload};
use crate::application::dto::response::{MessageResponse, TourResponse};
use crate::application::services::{TourService, TourServiceImpl};
use crate::domain::TourRepository;
use crate::presentation::http::extractors::{parse_id, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Page size when `limit` is omitted
const DEFAULT_PAGE_SIZE: i64 = 100;

fn tour_service(state: &AppState) -> TourServiceImpl<dyn TourRepository> {
    TourServiceImpl::new(state.tours.clone(), state.snowflake.clone())
}

fn responses(tours: Vec<crate::domain::Tour>) -> Json<Vec<TourResponse>> {
    Json(tours.into_iter().map(TourResponse::from).collect())
}

/// List tours
pub async fn list_tours(
    State(state): State<AppState>,
    Query(params): Query<TourListParams>,
) -> Result<Json<Vec<TourResponse>>, AppError> {
    let tours = tour_service(&state)
        .list_tours(
            params.skip.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(responses(tours))
}

/// Tours with the most remaining spots
pub async fn popular_tours(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> Result<Json<Vec<TourResponse>>, AppError> {
    let tours = tour_service(&state).popular_tours(params.limit).await?;
    Ok(responses(tours))
}

/// Hot offers
pub async fn hot_tours(
    State(state): State<AppState>,
) -> Result<Json<Vec<TourResponse>>, AppError> {
    let tours = tour_service(&state).hot_tours().await?;
    Ok(responses(tours))
}

/// Get tour by ID
pub async fn get_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
) -> Result<Json<TourResponse>, AppError> {
    let tour_id = parse_id(&tour_id, "tour")?;
    let tour = tour_service(&state).get_tour(tour_id).await?;
    Ok(Json(TourResponse::from(tour)))
}

/// Create a tour (administrators only)
pub async fn create_tour(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<TourPayload>,
) -> Result<(StatusCode, Json<TourResponse>), AppError> {
    let tour = tour_service(&state)
        .create_tour(auth.actor(), body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(TourResponse::from(tour))))
}

/// Replace a tour (administrators only)
pub async fn update_tour(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(tour_id): Path<String>,
    ValidatedJson(body): ValidatedJson<TourPayload>,
) -> Result<Json<TourResponse>, AppError> {
    let tour_id = parse_id(&tour_id, "tour")?;
    let tour = tour_service(&state)
        .update_tour(auth.actor(), tour_id, body.into())
        .await?;
    Ok(Json(TourResponse::from(tour)))
}

/// Delete a tour without requests (administrators only)
pub async fn delete_tour(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(tour_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let tour_id = parse_id(&tour_id, "tour")?;
    tour_service(&state)
        .delete_tour(auth.actor(), tour_id)
        .await?;
    Ok(Json(MessageResponse::new("Tour deleted successfully")))
}
