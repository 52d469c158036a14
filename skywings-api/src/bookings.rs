use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use skywings_core::{Booking, CreateBookingInput};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/user/{user_id}", get(user_bookings))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid booking id: {}", raw)))
}

fn booking_list(bookings: Vec<Booking>) -> Json<Value> {
    let count = bookings.len();
    Json(json!({ "bookings": bookings, "count": count }))
}

async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let booking = state
        .bookings
        .create_booking(input)
        .await
        .map_err(|e| AppError::from_core(e, "Failed to create booking"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking created successfully",
            "booking": booking,
        })),
    ))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let booking = state
        .bookings
        .get_booking(id)
        .await
        .map_err(|e| AppError::from_core(e, "Failed to fetch booking"))?;

    Ok(Json(json!({ "booking": booking })))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;

    fetch_for_user(&state, user_id.trim()).await
}

async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    fetch_for_user(&state, &user_id).await
}

async fn fetch_for_user(state: &AppState, user_id: &str) -> Result<Json<Value>, AppError> {
    let bookings = state
        .bookings
        .bookings_for_user(user_id)
        .await
        .map_err(|e| AppError::from_core(e, "Failed to fetch bookings"))?;

    Ok(booking_list(bookings))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let booking = state
        .bookings
        .cancel_booking(id)
        .await
        .map_err(|e| AppError::from_core(e, "Failed to cancel booking"))?;

    Ok(Json(json!({ "booking": booking })))
}
