use chrono::{DateTime, Utc};
use serde::Deserialize;
use skywings_catalog::{parse_seat_list, SeatLabel};
use skywings_shared::Masked;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::{generate_booking_reference, Booking, BookingStatus, FlightDetails, Itinerary, Leg};
use crate::occupancy::OccupancyService;
use crate::repository::{BookingRepository, SeatKey, SeatLock};
use crate::{CoreError, CoreResult};

/// `total_amount` as clients send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn is_blank(&self) -> bool {
        matches!(self, AmountInput::Text(s) if s.trim().is_empty())
    }

    /// Finite and non-negative, or an error. Never NaN.
    pub fn to_amount(&self) -> CoreResult<f64> {
        let value = match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoreError::InvalidAmount(s.clone()))?,
        };

        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidAmount(value.to_string()));
        }
        Ok(value)
    }
}

/// Body of a booking request. Every field is optional here so that a missing
/// one is reported by name instead of as a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingInput {
    pub user_id: Option<String>,
    pub flight_id: Option<String>,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
    pub seat_number: Option<String>,
    pub total_amount: Option<AmountInput>,
    pub booking_status: Option<BookingStatus>,
    pub booking_date: Option<DateTime<Utc>>,
    pub flight_details: Option<FlightDetails>,
    pub return_flight_id: Option<String>,
    pub return_seat_number: Option<String>,
    pub return_flight_details: Option<FlightDetails>,
}

fn required(value: Option<String>, field: &'static str) -> CoreResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(CoreError::MissingField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn seats(raw: &str, field: &str) -> CoreResult<Vec<SeatLabel>> {
    parse_seat_list(raw).map_err(|e| CoreError::InvalidSeat(format!("{}: {}", field, e)))
}

impl CreateBookingInput {
    /// Validates the request and builds the booking to persist.
    ///
    /// Required fields are checked in a fixed order and the first absent one is
    /// reported. `id` and `created_at` are always generated here.
    pub fn into_booking(self, now: DateTime<Utc>) -> CoreResult<Booking> {
        let user_id = required(self.user_id, "user_id")?;
        let flight_id = required(self.flight_id, "flight_id")?;
        let passenger_name = required(self.passenger_name, "passenger_name")?;
        let passenger_email = required(self.passenger_email, "passenger_email")?;
        let seat_number = required(self.seat_number, "seat_number")?;
        let total_amount = match self.total_amount {
            Some(amount) if !amount.is_blank() => amount.to_amount()?,
            _ => return Err(CoreError::MissingField("total_amount")),
        };

        let outbound = Leg {
            flight_id,
            seats: seats(&seat_number, "seat_number")?,
            details: self.flight_details,
        };

        let itinerary = match (optional(self.return_flight_id), optional(self.return_seat_number)) {
            (None, None) => {
                if self.return_flight_details.is_some() {
                    warn!("Ignoring return_flight_details on a one-way booking");
                }
                Itinerary::OneWay { outbound }
            }
            (Some(return_flight_id), Some(return_seats)) => Itinerary::RoundTrip {
                outbound,
                inbound: Leg {
                    flight_id: return_flight_id,
                    seats: seats(&return_seats, "return_seat_number")?,
                    details: self.return_flight_details,
                },
            },
            (Some(_), None) => return Err(CoreError::MissingField("return_seat_number")),
            (None, Some(_)) => return Err(CoreError::MissingField("return_flight_id")),
        };

        Ok(Booking {
            id: Uuid::new_v4(),
            reference: generate_booking_reference(),
            user_id,
            passenger_name,
            passenger_email: Masked::new(passenger_email),
            status: self.booking_status.unwrap_or_default(),
            total_amount,
            booking_date: self.booking_date.unwrap_or(now),
            created_at: now,
            itinerary,
        })
    }
}

/// Default claim time for seats while a booking is written.
pub const DEFAULT_SEAT_LOCK_TTL: Duration = Duration::from_secs(900);

async fn release_seats(lock: &dyn SeatLock, keys: &[SeatKey], owner: &str) {
    for key in keys {
        if let Err(e) = lock.release(key, owner).await {
            warn!(seat = %key, error = %e, "Failed to release seat lock");
        }
    }
}

/// Booking lifecycle operations over an injected store.
#[derive(Clone)]
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    seat_lock: Option<Arc<dyn SeatLock>>,
    lock_ttl: Duration,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self {
            repo,
            seat_lock: None,
            lock_ttl: DEFAULT_SEAT_LOCK_TTL,
        }
    }

    /// Enables seat claiming: each seat is locked and re-checked against the
    /// occupancy set before the booking is written.
    pub fn with_seat_lock(mut self, lock: Arc<dyn SeatLock>, ttl: Duration) -> Self {
        self.seat_lock = Some(lock);
        self.lock_ttl = ttl;
        self
    }

    pub async fn create_booking(&self, input: CreateBookingInput) -> CoreResult<Booking> {
        let booking = input.into_booking(Utc::now())?;
        let owner = booking.id.to_string();

        let claimed = match &self.seat_lock {
            Some(lock) => self.claim_seats(lock.as_ref(), &booking, &owner).await?,
            None => Vec::new(),
        };

        if let Err(e) = self.repo.put(&booking).await {
            // Nothing was stored, so the seats must not stay held until the TTL runs out.
            if let Some(lock) = &self.seat_lock {
                release_seats(lock.as_ref(), &claimed, &owner).await;
            }
            return Err(e.into());
        }

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            flight_id = booking.flight_id(),
            round_trip = booking.itinerary.is_round_trip(),
            "Booking created"
        );
        Ok(booking)
    }

    /// Locks every seat of every leg for `owner`. On conflict the seats taken so
    /// far are released again.
    async fn claim_seats(&self, lock: &dyn SeatLock, booking: &Booking, owner: &str) -> CoreResult<Vec<SeatKey>> {
        let occupancy = OccupancyService::new(self.repo.clone());
        let mut claimed: Vec<SeatKey> = Vec::new();

        let result = async {
            for leg in booking.itinerary.legs() {
                let date = leg.departure_date();
                let taken = occupancy.occupied_seats(&leg.flight_id, date).await?;

                for seat in &leg.seats {
                    let key = SeatKey {
                        flight_id: leg.flight_id.clone(),
                        departure_date: date,
                        seat: *seat,
                    };
                    if taken.contains(seat) || !lock.acquire(&key, owner, self.lock_ttl).await? {
                        return Err(CoreError::SeatUnavailable(format!("{} on {}", seat, leg.flight_id)));
                    }
                    claimed.push(key);
                }
            }
            Ok::<(), CoreError>(())
        }
        .await;

        match result {
            Ok(()) => Ok(claimed),
            Err(e) => {
                release_seats(lock, &claimed, owner).await;
                Err(e)
            }
        }
    }

    pub async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking".to_string()))
    }

    /// Newest booking first.
    pub async fn bookings_for_user(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        Ok(self.repo.query_by_user(user_id).await?)
    }

    pub async fn cancel_booking(&self, id: Uuid) -> CoreResult<Booking> {
        let booking = self.get_booking(id).await?;
        let next = BookingStatus::Cancelled;

        if !booking.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        let updated = self
            .repo
            .update_status(id, next)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking".to_string()))?;

        info!(booking_id = %id, "Booking cancelled");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryBookingRepository, InMemorySeatLock};
    use crate::repository::RepoResult;
    use chrono::NaiveDate;
    use serde_json::json;

    fn input(value: serde_json::Value) -> CreateBookingInput {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "user_id": "user-1",
            "flight_id": "SW100",
            "passenger_name": "Jane Doe",
            "passenger_email": "jane@example.com",
            "seat_number": "12C",
            "total_amount": "450.50"
        })
    }

    #[test]
    fn test_defaults_applied() {
        let now = Utc::now();
        let booking = input(valid()).into_booking(now).unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.booking_date, now);
        assert_eq!(booking.created_at, now);
        assert_eq!(booking.total_amount, 450.5);
        assert!(!booking.itinerary.is_round_trip());
    }

    #[test]
    fn test_caller_cannot_choose_id_or_created_at() {
        let mut raw = valid();
        raw["id"] = json!("00000000-0000-0000-0000-000000000001");
        raw["created_at"] = json!("2020-01-01T00:00:00Z");
        raw["booking_date"] = json!("2026-09-30T12:00:00Z");
        raw["booking_status"] = json!("pending");

        let now = Utc::now();
        let booking = input(raw).into_booking(now).unwrap();
        assert_ne!(booking.id.to_string(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(booking.created_at, now);
        assert_eq!(booking.booking_date.to_rfc3339(), "2026-09-30T12:00:00+00:00");
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_each_required_field_reported_by_name() {
        for field in [
            "user_id",
            "flight_id",
            "passenger_name",
            "passenger_email",
            "seat_number",
            "total_amount",
        ] {
            let mut missing = valid();
            missing.as_object_mut().unwrap().remove(field);
            let err = input(missing).into_booking(Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::MissingField(f) if f == field), "{}", field);

            let mut blank = valid();
            blank[field] = json!("  ");
            let err = input(blank).into_booking(Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::MissingField(f) if f == field), "{}", field);
        }
    }

    #[test]
    fn test_non_numeric_amount_rejected() {
        for bad in [json!("abc"), json!("NaN"), json!("-5"), json!("inf")] {
            let mut raw = valid();
            raw["total_amount"] = bad;
            let err = input(raw).into_booking(Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::InvalidAmount(_)));
        }

        let mut raw = valid();
        raw["total_amount"] = json!(612);
        assert_eq!(input(raw).into_booking(Utc::now()).unwrap().total_amount, 612.0);
    }

    #[test]
    fn test_invalid_seat_rejected() {
        let mut raw = valid();
        raw["seat_number"] = json!("12C,45Z");
        let err = input(raw).into_booking(Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSeat(_)));
    }

    #[test]
    fn test_round_trip_needs_both_return_fields() {
        let mut raw = valid();
        raw["return_flight_id"] = json!("SW101");
        let err = input(raw).into_booking(Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::MissingField("return_seat_number")));

        let mut raw = valid();
        raw["return_seat_number"] = json!("14D");
        let err = input(raw).into_booking(Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::MissingField("return_flight_id")));

        let mut raw = valid();
        raw["return_flight_id"] = json!("SW101");
        raw["return_seat_number"] = json!("14D");
        let booking = input(raw).into_booking(Utc::now()).unwrap();
        assert_eq!(booking.itinerary.inbound().unwrap().seat_number(), "14D");
    }

    #[tokio::test]
    async fn test_create_persists_one_record() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let service = BookingService::new(repo.clone());

        let booking = service.create_booking(input(valid())).await.unwrap();
        assert_eq!(repo.len().await, 1);

        let stored = service.get_booking(booking.id).await.unwrap();
        assert_eq!(stored, booking);
        assert_eq!(stored.total_amount, 450.5);
    }

    #[tokio::test]
    async fn test_missing_field_writes_nothing() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let service = BookingService::new(repo.clone());

        let mut raw = valid();
        raw.as_object_mut().unwrap().remove("passenger_email");
        let result = service.create_booking(input(raw)).await;

        assert!(matches!(result, Err(CoreError::MissingField("passenger_email"))));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_bookings_for_user_newest_first() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let service = BookingService::new(repo);

        for date in ["2026-09-01T10:00:00Z", "2026-10-01T10:00:00Z", "2026-08-01T10:00:00Z"] {
            let mut raw = valid();
            raw["booking_date"] = json!(date);
            service.create_booking(input(raw)).await.unwrap();
        }
        let mut other = valid();
        other["user_id"] = json!("user-2");
        service.create_booking(input(other)).await.unwrap();

        let bookings = service.bookings_for_user("user-1").await.unwrap();
        let dates: Vec<String> = bookings
            .iter()
            .map(|b| b.booking_date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2026-10-01", "2026-09-01", "2026-08-01"]);
    }

    #[tokio::test]
    async fn test_cancel_transitions_once() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let service = BookingService::new(repo);
        let booking = service.create_booking(input(valid())).await.unwrap();

        let cancelled = service.cancel_booking(booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = service.cancel_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        let err = service.cancel_booking(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_seat_lock_blocks_double_booking() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let locks = Arc::new(InMemorySeatLock::new());
        let service = BookingService::new(repo.clone())
            .with_seat_lock(locks.clone(), Duration::from_secs(60));

        let mut first = valid();
        first["flight_details"] = json!({ "departure_date": "2026-11-02" });
        service.create_booking(input(first.clone())).await.unwrap();

        let mut second = first.clone();
        second["user_id"] = json!("user-2");
        second["seat_number"] = json!("12D,12C");
        let err = service.create_booking(input(second)).await.unwrap_err();
        assert!(matches!(err, CoreError::SeatUnavailable(_)));
        assert_eq!(repo.len().await, 1);

        // 12D was claimed and then released when 12C failed.
        let key = SeatKey {
            flight_id: "SW100".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            seat: "12D".parse().unwrap(),
        };
        assert!(locks.acquire(&key, "someone", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn test_seat_lock_checks_return_leg_occupancy() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let service = BookingService::new(repo.clone())
            .with_seat_lock(Arc::new(InMemorySeatLock::new()), Duration::from_secs(60));

        // Someone flies SW100 home in 14D.
        let mut round_trip = valid();
        round_trip["flight_id"] = json!("SW200");
        round_trip["return_flight_id"] = json!("SW100");
        round_trip["return_seat_number"] = json!("14D");
        service.create_booking(input(round_trip)).await.unwrap();

        let mut outbound = valid();
        outbound["user_id"] = json!("user-2");
        outbound["seat_number"] = json!("14D");
        let err = service.create_booking(input(outbound)).await.unwrap_err();
        assert!(matches!(err, CoreError::SeatUnavailable(_)));
    }

    struct FailingWrites {
        inner: InMemoryBookingRepository,
    }

    #[async_trait::async_trait]
    impl BookingRepository for FailingWrites {
        async fn put(&self, _: &Booking) -> RepoResult<()> {
            Err("write timeout".into())
        }
        async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Booking>> {
            self.inner.get_by_id(id).await
        }
        async fn query_by_user(&self, user_id: &str) -> RepoResult<Vec<Booking>> {
            self.inner.query_by_user(user_id).await
        }
        async fn query_by_flight(&self, flight_id: &str, date: Option<NaiveDate>) -> RepoResult<Vec<Booking>> {
            self.inner.query_by_flight(flight_id, date).await
        }
        async fn scan_by_return_flight(&self, flight_id: &str, date: Option<NaiveDate>) -> RepoResult<Vec<Booking>> {
            self.inner.scan_by_return_flight(flight_id, date).await
        }
        async fn update_status(&self, id: Uuid, status: BookingStatus) -> RepoResult<Option<Booking>> {
            self.inner.update_status(id, status).await
        }
    }

    #[tokio::test]
    async fn test_failed_write_releases_seat_locks() {
        let repo = Arc::new(FailingWrites {
            inner: InMemoryBookingRepository::new(),
        });
        let locks = Arc::new(InMemorySeatLock::new());
        let service = BookingService::new(repo).with_seat_lock(locks.clone(), Duration::from_secs(900));

        let mut body = valid();
        body["flight_details"] = json!({ "departure_date": "2026-11-02" });
        body["return_flight_id"] = json!("SW101");
        body["return_seat_number"] = json!("14D");
        let err = service.create_booking(input(body)).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));

        for (flight_id, date, seat) in [
            ("SW100", NaiveDate::from_ymd_opt(2026, 11, 2), "12C"),
            ("SW101", None, "14D"),
        ] {
            let key = SeatKey {
                flight_id: flight_id.to_string(),
                departure_date: date,
                seat: seat.parse().unwrap(),
            };
            assert!(locks.acquire(&key, "retry", Duration::from_secs(60)).await.unwrap());
        }
    }
}
