use chrono::NaiveDate;
use serde::Serialize;
use skywings_catalog::SeatLabel;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::repository::BookingRepository;
use crate::CoreResult;

/// Occupied seats as reported to a seat picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub seats: BTreeSet<SeatLabel>,
    /// Lookup failed and `seats` is empty by policy, not by fact.
    pub degraded: bool,
}

/// Computes which seats on a physical departure are already taken.
///
/// A flight fills up from two directions: travellers who fly it outbound and
/// round-trip travellers who fly it home. Both count.
#[derive(Clone)]
pub struct OccupancyService {
    repo: Arc<dyn BookingRepository>,
}

impl OccupancyService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn occupied_seats(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> CoreResult<BTreeSet<SeatLabel>> {
        let outbound = self.repo.query_by_flight(flight_id, date).await?;
        let inbound = self.repo.scan_by_return_flight(flight_id, date).await?;

        debug!(
            flight_id,
            outbound = outbound.len(),
            inbound = inbound.len(),
            "Collected bookings for occupancy"
        );

        let mut seats = BTreeSet::new();
        for booking in &outbound {
            seats.extend(booking.itinerary.outbound().seats.iter().copied());
        }
        for booking in &inbound {
            if let Some(leg) = booking.itinerary.inbound() {
                seats.extend(leg.seats.iter().copied());
            }
        }

        Ok(seats)
    }

    /// Never fails: a broken lookup is logged and reported as "nothing known
    /// to be occupied" so seat selection can continue.
    pub async fn occupied_seats_or_empty(
        &self,
        flight_id: &str,
        date: Option<NaiveDate>,
    ) -> Availability {
        match self.occupied_seats(flight_id, date).await {
            Ok(seats) => Availability {
                seats,
                degraded: false,
            },
            Err(e) => {
                warn!(flight_id, error = %e, "Seat availability lookup failed, assuming no seats occupied");
                Availability {
                    seats: BTreeSet::new(),
                    degraded: true,
                }
            }
        }
    }
}
