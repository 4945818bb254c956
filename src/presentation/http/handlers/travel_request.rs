//! Travel Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    CreateTravelRequest, GuestTravelRequest, UpdateStatusRequest,
};
use crate::application::dto::response::TravelRequestResponse;
use crate::application::services::{
    TravelRequestError, TravelRequestService, TravelRequestServiceImpl,
};
use crate::domain::{TourRepository, TravelRequest, TravelRequestRepository, UserRepository};
use crate::infrastructure::metrics;
use crate::presentation::http::extractors::{parse_id, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Service =
    TravelRequestServiceImpl<dyn TravelRequestRepository, dyn TourRepository, dyn UserRepository>;

fn request_service(state: &AppState) -> Service {
    TravelRequestServiceImpl::new(
        state.requests.clone(),
        state.tours.clone(),
        state.users.clone(),
        state.notifications.clone(),
        state.snowflake.clone(),
    )
}

fn responses(requests: Vec<TravelRequest>) -> Json<Vec<TravelRequestResponse>> {
    Json(requests.into_iter().map(TravelRequestResponse::from).collect())
}

/// Submit a request as the authenticated user
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateTravelRequest>,
) -> Result<(StatusCode, Json<TravelRequestResponse>), AppError> {
    let request = request_service(&state)
        .create_request(auth.actor(), body.tour_id, body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(TravelRequestResponse::from(request))))
}

/// Submit a request without an account
pub async fn create_guest_request(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<GuestTravelRequest>,
) -> Result<(StatusCode, Json<TravelRequestResponse>), AppError> {
    let contact = body.contact();
    let request = request_service(&state)
        .create_guest_request(body.tour_id, contact, body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(TravelRequestResponse::from(request))))
}

/// Requests submitted by the authenticated user
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<TravelRequestResponse>>, AppError> {
    let requests = request_service(&state).my_requests(auth.actor()).await?;
    Ok(responses(requests))
}

/// Every request (administrators only)
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<TravelRequestResponse>>, AppError> {
    let requests = request_service(&state).all_requests(auth.actor()).await?;
    Ok(responses(requests))
}

/// Get request by ID
pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
) -> Result<Json<TravelRequestResponse>, AppError> {
    let request_id = parse_id(&request_id, "request")?;
    let request = request_service(&state)
        .get_request(auth.actor(), request_id)
        .await?;
    Ok(Json(TravelRequestResponse::from(request)))
}

/// Change a request's status (administrators only)
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<TravelRequestResponse>, AppError> {
    // Privilege is checked before the id or body are looked at
    if !auth.is_admin {
        metrics::record_transition("unknown", "forbidden");
        return Err(TravelRequestError::Forbidden.into());
    }
    let request_id = parse_id(&request_id, "request")?;
    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let request = request_service(&state)
        .transition(auth.actor(), request_id, &body.status)
        .await?;
    Ok(Json(TravelRequestResponse::from(request)))
}
