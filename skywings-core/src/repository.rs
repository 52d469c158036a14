use async_trait::async_trait;
use chrono::NaiveDate;
use skywings_catalog::SeatLabel;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Repository trait for booking records.
///
/// Reads are allowed to lag writes; callers never rely on read-your-writes.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn put(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    /// Bookings of one user, newest `booking_date` first.
    async fn query_by_user(&self, user_id: &str) -> RepoResult<Vec<Booking>>;

    /// Bookings whose outbound leg is `flight_id`, optionally only those whose
    /// outbound snapshot departs on `date`.
    async fn query_by_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>>;

    /// Bookings whose return leg is `flight_id`, optionally only those whose
    /// return snapshot departs on `date`.
    async fn scan_by_return_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>>;

    /// Returns the updated booking, or `None` if no booking has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> RepoResult<Option<Booking>>;
}

/// Identifies one physical seat on one departure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatKey {
    pub flight_id: String,
    pub departure_date: Option<NaiveDate>,
    pub seat: SeatLabel,
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.departure_date {
            Some(date) => write!(f, "seat:{}:{}:{}", self.flight_id, date, self.seat),
            None => write!(f, "seat:{}:any:{}", self.flight_id, self.seat),
        }
    }
}

/// Short-lived exclusive claim on a seat while a booking is written.
#[async_trait]
pub trait SeatLock: Send + Sync {
    /// `Ok(false)` when another owner already holds the seat.
    async fn acquire(&self, key: &SeatKey, owner: &str, ttl: Duration) -> RepoResult<bool>;

    /// Releases the claim only if `owner` still holds it.
    async fn release(&self, key: &SeatKey, owner: &str) -> RepoResult<()>;
}
