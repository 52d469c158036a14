use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pricing::seats_total;
use crate::seat::{join_seats, SeatLabel};

/// What a click on a seat did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOutcome {
    Added,
    Removed,
    /// Single-passenger leg: the new seat took the place of the old one.
    Replaced { previous: SeatLabel },
    /// Seat is occupied; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("You can only select {max} seats for {max} passengers")]
    Capacity { max: usize },

    #[error("A leg needs at least one passenger")]
    NoPassengers,
}

/// Seats picked for one leg, capped at the passenger count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelection {
    max_passengers: usize,
    seats: Vec<SeatLabel>,
}

impl SeatSelection {
    pub fn new(max_passengers: usize) -> Result<Self, SelectionError> {
        if max_passengers == 0 {
            return Err(SelectionError::NoPassengers);
        }
        Ok(Self {
            max_passengers,
            seats: Vec::new(),
        })
    }

    /// Starts from an existing pick, e.g. one carried over in a request.
    /// More distinct seats than passengers is a capacity error.
    pub fn with_seats(max_passengers: usize, seats: &[SeatLabel]) -> Result<Self, SelectionError> {
        let mut selection = Self::new(max_passengers)?;
        for seat in seats {
            if !selection.seats.contains(seat) {
                selection.seats.push(*seat);
            }
        }
        if selection.seats.len() > max_passengers {
            return Err(SelectionError::Capacity { max: max_passengers });
        }
        Ok(selection)
    }

    /// Deselects seats that someone else has booked since they were picked.
    /// Returns the dropped seats in selection order.
    pub fn drop_occupied(&mut self, occupied: &BTreeSet<SeatLabel>) -> Vec<SeatLabel> {
        let (taken, kept): (Vec<SeatLabel>, Vec<SeatLabel>) =
            self.seats.iter().copied().partition(|s| occupied.contains(s));
        self.seats = kept;
        taken
    }

    pub fn max_passengers(&self) -> usize {
        self.max_passengers
    }

    pub fn seats(&self) -> &[SeatLabel] {
        &self.seats
    }

    pub fn contains(&self, seat: &SeatLabel) -> bool {
        self.seats.contains(seat)
    }

    /// Applies a click on `seat`.
    ///
    /// Occupied seats are never selectable. A selected seat is deselected. At
    /// capacity, a single-passenger leg swaps its seat while a larger party is
    /// refused with [`SelectionError::Capacity`].
    pub fn toggle(
        &mut self,
        seat: SeatLabel,
        occupied: &BTreeSet<SeatLabel>,
    ) -> Result<SelectionOutcome, SelectionError> {
        if occupied.contains(&seat) {
            return Ok(SelectionOutcome::Ignored);
        }

        if let Some(pos) = self.seats.iter().position(|s| *s == seat) {
            self.seats.remove(pos);
            return Ok(SelectionOutcome::Removed);
        }

        if self.seats.len() >= self.max_passengers {
            if self.max_passengers == 1 {
                let previous = self.seats[0];
                self.seats = vec![seat];
                return Ok(SelectionOutcome::Replaced { previous });
            }
            return Err(SelectionError::Capacity {
                max: self.max_passengers,
            });
        }

        self.seats.push(seat);
        Ok(SelectionOutcome::Added)
    }

    /// Exactly one seat per passenger.
    pub fn is_complete(&self) -> bool {
        self.seats.len() == self.max_passengers
    }

    pub fn surcharge(&self) -> u32 {
        seats_total(&self.seats)
    }

    /// Comma-joined value stored in a booking's seat field.
    pub fn seat_number(&self) -> String {
        join_seats(&self.seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(raw: &str) -> SeatLabel {
        raw.parse().unwrap()
    }

    #[test]
    fn test_single_passenger_replaces() {
        let occupied = BTreeSet::new();
        let mut selection = SeatSelection::new(1).unwrap();
        selection.toggle(seat("5B"), &occupied).unwrap();

        let outcome = selection.toggle(seat("3A"), &occupied).unwrap();
        assert_eq!(outcome, SelectionOutcome::Replaced { previous: seat("5B") });
        assert_eq!(selection.seats(), &[seat("3A")]);
    }

    #[test]
    fn test_party_appends_in_click_order() {
        let occupied = BTreeSet::new();
        let mut selection = SeatSelection::new(2).unwrap();
        selection.toggle(seat("5B"), &occupied).unwrap();
        selection.toggle(seat("3A"), &occupied).unwrap();

        assert_eq!(selection.seats(), &[seat("5B"), seat("3A")]);
        assert!(selection.is_complete());
        assert_eq!(selection.seat_number(), "5B,3A");
        assert_eq!(selection.surcharge(), 100);
    }

    #[test]
    fn test_party_over_capacity_rejected() {
        let occupied = BTreeSet::new();
        let mut selection = SeatSelection::with_seats(2, &[seat("5B"), seat("3A")]).unwrap();

        let result = selection.toggle(seat("20C"), &occupied);
        assert_eq!(result, Err(SelectionError::Capacity { max: 2 }));
        assert_eq!(selection.seats(), &[seat("5B"), seat("3A")]);
    }

    #[test]
    fn test_reselect_toggles_off() {
        let occupied = BTreeSet::new();
        let mut selection = SeatSelection::new(3).unwrap();
        selection.toggle(seat("12C"), &occupied).unwrap();

        let outcome = selection.toggle(seat("12C"), &occupied).unwrap();
        assert_eq!(outcome, SelectionOutcome::Removed);
        assert!(selection.seats().is_empty());
    }

    #[test]
    fn test_occupied_seat_is_noop() {
        let occupied: BTreeSet<SeatLabel> = [seat("3A")].into_iter().collect();
        let mut selection = SeatSelection::with_seats(1, &[seat("5B")]).unwrap();

        let outcome = selection.toggle(seat("3A"), &occupied).unwrap();
        assert_eq!(outcome, SelectionOutcome::Ignored);
        assert_eq!(selection.seats(), &[seat("5B")]);
    }

    #[test]
    fn test_zero_passengers_rejected() {
        assert_eq!(SeatSelection::new(0), Err(SelectionError::NoPassengers));
    }

    #[test]
    fn test_carried_over_pick_beyond_capacity_rejected() {
        let result = SeatSelection::with_seats(2, &[seat("5B"), seat("6B"), seat("7B")]);
        assert_eq!(result, Err(SelectionError::Capacity { max: 2 }));

        // Repeats collapse before the count.
        let selection = SeatSelection::with_seats(2, &[seat("5B"), seat("5B"), seat("6B")]).unwrap();
        assert_eq!(selection.seats(), &[seat("5B"), seat("6B")]);
    }

    #[test]
    fn test_drop_occupied() {
        let occupied: BTreeSet<SeatLabel> = [seat("1A")].into_iter().collect();
        let mut selection = SeatSelection::with_seats(2, &[seat("1A"), seat("5B")]).unwrap();

        assert_eq!(selection.drop_occupied(&occupied), vec![seat("1A")]);
        assert_eq!(selection.seats(), &[seat("5B")]);
        assert!(!selection.is_complete());
        assert!(selection.drop_occupied(&occupied).is_empty());
    }
}
