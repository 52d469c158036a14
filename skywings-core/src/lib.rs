pub mod booking;
pub mod repository;
pub mod memory;
pub mod occupancy;
pub mod booking_flow;

pub use booking::{generate_booking_reference, Booking, BookingRecord, BookingStatus, FlightDetails, Itinerary, Leg};
pub use booking_flow::{AmountInput, BookingService, CreateBookingInput};
pub use occupancy::{Availability, OccupancyService};
pub use repository::{BookingRepository, RepoResult, SeatKey, SeatLock};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid total_amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid seat selection: {0}")]
    InvalidSeat(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Cannot change booking status from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },
    #[error("Seat unavailable: {0}")]
    SeatUnavailable(String),
    #[error("Store operation failed: {0}")]
    Store(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Store(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
