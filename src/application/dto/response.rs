//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings so JavaScript clients do not lose precision.

use serde::Serialize;

use crate::application::services::AuthTokens;
use crate::domain::{Tour, TravelRequest, User};

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Registration response (includes user and token)
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub token: TokenResponse,
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Tour response
#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub duration: i32,
    pub image_url: Option<String>,
    pub rating: f64,
    pub max_participants: i32,
    pub available_spots: i32,
    pub is_hot: bool,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub created_at: String,
}

impl From<Tour> for TourResponse {
    fn from(tour: Tour) -> Self {
        Self {
            id: tour.id.to_string(),
            title: tour.title,
            description: tour.description,
            location: tour.location,
            price: tour.price,
            duration: tour.duration,
            image_url: tour.image_url,
            rating: tour.rating,
            max_participants: tour.max_participants,
            available_spots: tour.available_spots,
            is_hot: tour.is_hot,
            departure_date: tour.departure_date.map(|d| d.to_rfc3339()),
            return_date: tour.return_date.map(|d| d.to_rfc3339()),
            created_at: tour.created_at.to_rfc3339(),
        }
    }
}

/// Travel request response
///
/// Exactly one of `user_id` and the `guest_*` group is non-null.
#[derive(Debug, Serialize)]
pub struct TravelRequestResponse {
    pub id: String,
    pub tour_id: String,
    pub user_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TravelRequest> for TravelRequestResponse {
    fn from(request: TravelRequest) -> Self {
        let guest = request.requester.guest().cloned();
        Self {
            id: request.id.to_string(),
            tour_id: request.tour_id.to_string(),
            user_id: request.requester.user_id().map(|id| id.to_string()),
            guest_name: guest.as_ref().map(|g| g.name.clone()),
            guest_email: guest.as_ref().map(|g| g.email.clone()),
            guest_phone: guest.map(|g| g.phone),
            comment: request.comment,
            status: request.status.to_string(),
            created_at: request.created_at.to_rfc3339(),
            updated_at: request.updated_at.to_rfc3339(),
        }
    }
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
