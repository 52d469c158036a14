use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use skywings_catalog::{parse_seat_list, AddOn, FareQuote, SeatLabel};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", post(quote))
        .route("/add-ons", get(list_add_ons))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub base_fare: f64,
    pub return_base_fare: Option<f64>,
    pub seat_number: Option<String>,
    pub return_seat_number: Option<String>,
    #[serde(default)]
    pub add_ons: Vec<String>,
}

fn fare(value: f64, field: &str) -> Result<f64, AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AppError::BadRequest(format!("Invalid {}: {}", field, value)))
    }
}

fn seats(raw: Option<&str>, field: &str) -> Result<Vec<SeatLabel>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => parse_seat_list(raw).map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", field, e))),
    }
}

fn add_on_view(add_on: AddOn) -> Value {
    json!({ "code": add_on, "name": add_on.name(), "price": add_on.price() })
}

async fn list_add_ons() -> Json<Value> {
    let add_ons: Vec<Value> = AddOn::ALL.into_iter().map(add_on_view).collect();
    Json(json!({ "add_ons": add_ons }))
}

async fn quote(payload: Result<Json<QuoteRequest>, JsonRejection>) -> Result<Json<Value>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let base_fare = fare(req.base_fare, "base_fare")?;
    let return_base_fare = req
        .return_base_fare
        .map(|f| fare(f, "return_base_fare"))
        .transpose()?;
    let outbound = seats(req.seat_number.as_deref(), "seat_number")?;
    let inbound = seats(req.return_seat_number.as_deref(), "return_seat_number")?;
    let add_ons = req
        .add_ons
        .iter()
        .map(|a| a.parse::<AddOn>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let quote = FareQuote::new(base_fare, return_base_fare, &outbound, &inbound, &add_ons);

    // One line per distinct add-on, matching what the quote charges.
    let mut lines: Vec<AddOn> = Vec::new();
    for add_on in add_ons {
        if !lines.contains(&add_on) {
            lines.push(add_on);
        }
    }
    let add_on_lines: Vec<Value> = lines.into_iter().map(add_on_view).collect();

    Ok(Json(json!({ "quote": quote, "add_ons": add_on_lines })))
}
