use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use skywings_catalog::{join_seats, parse_seat_list, SeatLabel, SeatLabelError};
use skywings_shared::Masked;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed moves: pending -> confirmed, and anything live -> cancelled.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Confirmed
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(BookingDecodeError::UnknownStatus(other.to_string())),
        }
    }
}

/// Snapshot of the flight taken when the booking was made.
///
/// Unknown keys are preserved in `extra` so a snapshot written by an older
/// client survives a round trip through the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passengers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_fare: Option<f64>,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One directional flight segment with the seats held on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub flight_id: String,
    pub seats: Vec<SeatLabel>,
    pub details: Option<FlightDetails>,
}

impl Leg {
    pub fn departure_date(&self) -> Option<NaiveDate> {
        self.details.as_ref().and_then(|d| d.departure_date)
    }

    /// Same flight and, when a date is given, same embedded departure date.
    /// A leg without a snapshot date never matches a dated query.
    pub fn matches(&self, flight_id: &str, date: Option<NaiveDate>) -> bool {
        if self.flight_id != flight_id {
            return false;
        }
        match date {
            Some(d) => self.departure_date() == Some(d),
            None => true,
        }
    }

    pub fn seat_number(&self) -> String {
        join_seats(&self.seats)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Itinerary {
    OneWay { outbound: Leg },
    RoundTrip { outbound: Leg, inbound: Leg },
}

impl Itinerary {
    pub fn outbound(&self) -> &Leg {
        match self {
            Itinerary::OneWay { outbound } | Itinerary::RoundTrip { outbound, .. } => outbound,
        }
    }

    pub fn inbound(&self) -> Option<&Leg> {
        match self {
            Itinerary::OneWay { .. } => None,
            Itinerary::RoundTrip { inbound, .. } => Some(inbound),
        }
    }

    pub fn is_round_trip(&self) -> bool {
        matches!(self, Itinerary::RoundTrip { .. })
    }

    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        std::iter::once(self.outbound()).chain(self.inbound())
    }
}

/// A purchase of one itinerary by one user.
///
/// On the wire and in the store this is the flat [`BookingRecord`] shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BookingRecord", try_from = "BookingRecord")]
pub struct Booking {
    pub id: Uuid,
    /// Short code shown to the passenger, e.g. `SW4K7Q2Z`.
    pub reference: String,
    pub user_id: String,
    pub passenger_name: String,
    pub passenger_email: Masked<String>,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub itinerary: Itinerary,
}

impl Booking {
    pub fn flight_id(&self) -> &str {
        &self.itinerary.outbound().flight_id
    }
}

const REFERENCE_PREFIX: &str = "SW";
const REFERENCE_LEN: usize = 6;
const REFERENCE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `SW` followed by six random characters from `0-9A-Z`.
pub fn generate_booking_reference() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..REFERENCE_LEN)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("{}{}", REFERENCE_PREFIX, code)
}

/// Flat booking row: one record per booking, return leg in `return_*` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub booking_reference: String,
    pub user_id: String,
    pub flight_id: String,
    pub passenger_name: String,
    pub passenger_email: String,
    pub seat_number: String,
    pub booking_status: BookingStatus,
    pub total_amount: f64,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_details: Option<FlightDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_flight_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_seat_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_flight_details: Option<FlightDetails>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingDecodeError {
    #[error("Invalid seat list: {0}")]
    Seats(#[from] SeatLabelError),

    #[error("Return leg is missing {0}")]
    IncompleteReturnLeg(&'static str),

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}

impl From<Booking> for BookingRecord {
    fn from(booking: Booking) -> Self {
        let (outbound, inbound) = match booking.itinerary {
            Itinerary::OneWay { outbound } => (outbound, None),
            Itinerary::RoundTrip { outbound, inbound } => (outbound, Some(inbound)),
        };

        let seat_number = outbound.seat_number();
        let return_seat_number = inbound.as_ref().map(Leg::seat_number);
        let (return_flight_id, return_flight_details) = match inbound {
            Some(leg) => (Some(leg.flight_id), leg.details),
            None => (None, None),
        };

        Self {
            id: booking.id,
            booking_reference: booking.reference,
            user_id: booking.user_id,
            flight_id: outbound.flight_id,
            passenger_name: booking.passenger_name,
            passenger_email: booking.passenger_email.into_inner(),
            seat_number,
            booking_status: booking.status,
            total_amount: booking.total_amount,
            booking_date: booking.booking_date,
            created_at: booking.created_at,
            flight_details: outbound.details,
            return_flight_id,
            return_seat_number,
            return_flight_details,
        }
    }
}

impl TryFrom<BookingRecord> for Booking {
    type Error = BookingDecodeError;

    fn try_from(record: BookingRecord) -> Result<Self, Self::Error> {
        let outbound = Leg {
            flight_id: record.flight_id,
            seats: parse_seat_list(&record.seat_number)?,
            details: record.flight_details,
        };

        let itinerary = match (record.return_flight_id, record.return_seat_number) {
            (None, None) => Itinerary::OneWay { outbound },
            (Some(flight_id), Some(seats)) => Itinerary::RoundTrip {
                outbound,
                inbound: Leg {
                    flight_id,
                    seats: parse_seat_list(&seats)?,
                    details: record.return_flight_details,
                },
            },
            (Some(_), None) => return Err(BookingDecodeError::IncompleteReturnLeg("return_seat_number")),
            (None, Some(_)) => return Err(BookingDecodeError::IncompleteReturnLeg("return_flight_id")),
        };

        Ok(Self {
            id: record.id,
            reference: record.booking_reference,
            user_id: record.user_id,
            passenger_name: record.passenger_name,
            passenger_email: Masked::new(record.passenger_email),
            status: record.booking_status,
            total_amount: record.total_amount,
            booking_date: record.booking_date,
            created_at: record.created_at,
            itinerary,
        })
    }
}
