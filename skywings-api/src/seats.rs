use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skywings_catalog::{parse_seat_list, SeatLabel, SeatMap, SeatSelection, SelectionOutcome};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/occupied-seats", get(occupied_seats))
        .route("/flights/{flight_id}/seat-map", get(seat_map))
}

#[derive(Debug, Deserialize)]
pub struct OccupiedSeatsQuery {
    pub flight_id: Option<String>,
    pub departure_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeatMapQuery {
    pub departure_date: Option<String>,
    pub passengers: Option<usize>,
    /// Comma-separated seats already picked for this leg.
    pub selected: Option<String>,
    /// A seat to toggle in the current selection.
    pub pick: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub flight_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<NaiveDate>,
    pub passengers: usize,
    pub seat_map: SeatMap,
    pub seat_number: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SelectionOutcome>,
    /// Carried-over seats dropped because they are booked now.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable_seats: Vec<SeatLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Blank means "any date".
fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid departure_date: {}", d))),
    }
}

async fn occupied_seats(
    State(state): State<AppState>,
    Query(query): Query<OccupiedSeatsQuery>,
) -> Result<Json<Value>, AppError> {
    let flight_id = query
        .flight_id
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("flight_id is required".to_string()))?;
    let date = parse_date(query.departure_date.as_deref())?;

    let seats = state
        .occupancy
        .occupied_seats(flight_id, date)
        .await
        .map_err(|e| AppError::from_core(e, "Failed to fetch occupied seats"))?;

    let count = seats.len();
    Ok(Json(json!({ "occupied_seats": seats, "count": count })))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<String>,
    Query(query): Query<SeatMapQuery>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let date = parse_date(query.departure_date.as_deref())?;
    let passengers = query.passengers.unwrap_or(1);

    let selected: Vec<SeatLabel> = match query.selected.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => parse_seat_list(raw).map_err(|e| AppError::BadRequest(format!("Invalid selected seats: {}", e)))?,
    };
    let availability = state.occupancy.occupied_seats_or_empty(&flight_id, date).await;

    let mut selection =
        SeatSelection::with_seats(passengers, &selected).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let unavailable_seats = selection.drop_occupied(&availability.seats);

    let outcome = match query.pick.as_deref() {
        None => None,
        Some(raw) => {
            let seat: SeatLabel = raw
                .trim()
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid seat {}: {}", raw, e)))?;
            if !state.layout.contains(&seat) {
                return Err(AppError::BadRequest(format!("Seat {} is not on this aircraft", seat)));
            }
            Some(
                selection
                    .toggle(seat, &availability.seats)
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            )
        }
    };

    let warning = availability
        .degraded
        .then(|| "Seat availability could not be loaded; all seats are shown as available".to_string());

    Ok(Json(SeatMapResponse {
        flight_id,
        departure_date: date,
        passengers,
        seat_map: SeatMap::build(&state.layout, &availability.seats, &selection),
        seat_number: selection.seat_number(),
        is_complete: selection.is_complete(),
        outcome,
        unavailable_seats,
        warning,
    }))
}
