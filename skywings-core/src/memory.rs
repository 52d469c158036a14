use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::repository::{BookingRepository, RepoResult, SeatKey, SeatLock};

/// In-memory booking store for tests and local development.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn put(&self, booking: &Booking) -> RepoResult<()> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn query_by_user(&self, user_id: &str) -> RepoResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        Ok(bookings)
    }

    async fn query_by_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.itinerary.outbound().matches(flight_id, date))
            .cloned()
            .collect())
    }

    async fn scan_by_return_flight(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> RepoResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| {
                b.itinerary
                    .inbound()
                    .is_some_and(|leg| leg.matches(flight_id, date))
            })
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> RepoResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.get_mut(&id).map(|b| {
            b.status = status;
            b.clone()
        }))
    }
}

/// Process-local seat locks with expiry, mirroring `SET NX EX` semantics.
#[derive(Default)]
pub struct InMemorySeatLock {
    held: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemorySeatLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks currently tracked, expired ones included until the next sweep.
    pub async fn len(&self) -> usize {
        self.held.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.held.lock().await.is_empty()
    }
}

#[async_trait]
impl SeatLock for InMemorySeatLock {
    async fn acquire(&self, key: &SeatKey, owner: &str, ttl: Duration) -> RepoResult<bool> {
        let mut held = self.held.lock().await;
        let now = Instant::now();
        let key = key.to_string();

        // Expired entries are dropped on every acquire so the map tracks live locks only.
        held.retain(|_, (_, expires_at)| *expires_at > now);

        if held.contains_key(&key) {
            return Ok(false);
        }

        held.insert(key, (owner.to_string(), now + ttl));
        Ok(true)
    }

    async fn release(&self, key: &SeatKey, owner: &str) -> RepoResult<()> {
        let mut held = self.held.lock().await;
        let key = key.to_string();
        if held.get(&key).is_some_and(|(holder, _)| holder == owner) {
            held.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywings_catalog::SeatLabel;

    fn key(seat: &str) -> SeatKey {
        SeatKey {
            flight_id: "SW100".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            seat: seat.parse::<SeatLabel>().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_seat_lock_is_exclusive_until_released() {
        let locks = InMemorySeatLock::new();
        let ttl = Duration::from_secs(60);

        assert!(locks.acquire(&key("12C"), "a", ttl).await.unwrap());
        assert!(!locks.acquire(&key("12C"), "b", ttl).await.unwrap());
        assert!(locks.acquire(&key("12D"), "b", ttl).await.unwrap());

        // Only the holder can release.
        locks.release(&key("12C"), "b").await.unwrap();
        assert!(!locks.acquire(&key("12C"), "b", ttl).await.unwrap());

        locks.release(&key("12C"), "a").await.unwrap();
        assert!(locks.acquire(&key("12C"), "b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_taken() {
        let locks = InMemorySeatLock::new();
        assert!(locks.acquire(&key("1A"), "a", Duration::ZERO).await.unwrap());
        assert!(locks.acquire(&key("1A"), "b", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_locks_are_swept() {
        let locks = InMemorySeatLock::new();
        for seat in ["1A", "1B", "1C"] {
            assert!(locks.acquire(&key(seat), "a", Duration::ZERO).await.unwrap());
        }

        assert!(locks.acquire(&key("2A"), "b", Duration::from_secs(60)).await.unwrap());
        assert_eq!(locks.len().await, 1);

        locks.release(&key("2A"), "b").await.unwrap();
        assert!(locks.is_empty().await);
    }

    #[test]
    fn test_seat_key_format() {
        assert_eq!(key("14D").to_string(), "seat:SW100:2026-11-02:14D");
        let undated = SeatKey { departure_date: None, ..key("14D") };
        assert_eq!(undated.to_string(), "seat:SW100:any:14D");
    }
}
