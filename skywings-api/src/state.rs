use std::sync::Arc;
use std::time::Duration;

use skywings_catalog::CabinLayout;
use skywings_core::memory::InMemoryBookingRepository;
use skywings_core::{BookingRepository, BookingService, OccupancyService, SeatLock};

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub occupancy: OccupancyService,
    pub layout: CabinLayout,
}

impl AppState {
    pub fn new(repo: Arc<dyn BookingRepository>, seat_lock: Option<(Arc<dyn SeatLock>, Duration)>) -> Self {
        let mut bookings = BookingService::new(repo.clone());
        if let Some((lock, ttl)) = seat_lock {
            bookings = bookings.with_seat_lock(lock, ttl);
        }

        Self {
            bookings,
            occupancy: OccupancyService::new(repo),
            layout: CabinLayout::standard(),
        }
    }

    /// Fresh in-memory store, no seat locks.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBookingRepository::new()), None)
    }
}
