pub mod seat;
pub mod layout;
pub mod pricing;
pub mod selection;

pub use seat::{Column, SeatLabel, SeatLabelError, parse_seat_list, join_seats};
pub use layout::{CabinLayout, SeatMap, SeatRow, SeatView};
pub use pricing::{AddOn, FareQuote, SeatTier, UnknownAddOn, seat_price, seats_total};
pub use selection::{SeatSelection, SelectionError, SelectionOutcome};
