//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::application::services::TourDraft;
use crate::domain::GuestContact;

/// Accept a Snowflake id either as a JSON string or as a number.
///
/// Responses render ids as strings, so clients echo them back that way.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {text:?}"))),
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 64, message = "Username must be 2-64 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Create or replace a tour
#[derive(Debug, Deserialize, Validate)]
pub struct TourPayload {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    #[validate(range(min = 1, message = "Duration must be at least one day"))]
    pub duration: i32,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: f64,

    #[validate(range(min = 0, message = "max_participants must not be negative"))]
    pub max_participants: i32,

    #[validate(range(min = 0, message = "available_spots must not be negative"))]
    pub available_spots: Option<i32>,

    #[serde(default)]
    pub is_hot: bool,

    pub departure_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
}

impl From<TourPayload> for TourDraft {
    fn from(body: TourPayload) -> Self {
        Self {
            title: body.title.trim().to_string(),
            description: body.description,
            location: body.location,
            price: body.price,
            duration: body.duration,
            image_url: body.image_url,
            rating: body.rating,
            max_participants: body.max_participants,
            available_spots: body.available_spots,
            is_hot: body.is_hot,
            departure_date: body.departure_date,
            return_date: body.return_date,
        }
    }
}

/// Tour list query parameters
#[derive(Debug, Deserialize)]
pub struct TourListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Popular tours query parameters
#[derive(Debug, Deserialize)]
pub struct PopularParams {
    pub limit: Option<i64>,
}

/// Travel request by a registered user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTravelRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub tour_id: i64,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Travel request by a guest
#[derive(Debug, Deserialize, Validate)]
pub struct GuestTravelRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub tour_id: i64,

    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub guest_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub guest_email: String,

    #[validate(
        length(min = 3, max = 32, message = "Phone must be 3-32 characters"),
        custom(function = "not_blank")
    )]
    pub guest_phone: String,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

impl GuestTravelRequest {
    pub fn contact(&self) -> GuestContact {
        GuestContact {
            name: self.guest_name.clone(),
            email: self.guest_email.clone(),
            phone: self.guest_phone.clone(),
        }
    }
}

/// Status change by an administrator; the value is parsed by the workflow
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
