use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::seat::SeatLabel;

/// Pricing tier of a seat, decided purely by its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatTier {
    /// Rows 1-5
    Premium,
    /// Rows 6-10
    ExtraLegroom,
    /// Rows 11-30, free
    Standard,
}

impl SeatTier {
    /// Tier for a 1-based row number. Boundaries are on the 0-based index.
    pub fn for_row(row: u8) -> Self {
        let index = row.saturating_sub(1);
        if index < 5 {
            SeatTier::Premium
        } else if index < 10 {
            SeatTier::ExtraLegroom
        } else {
            SeatTier::Standard
        }
    }

    pub fn surcharge(self) -> u32 {
        match self {
            SeatTier::Premium => 50,
            SeatTier::ExtraLegroom => 30,
            SeatTier::Standard => 0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeatTier::Premium => "Premium",
            SeatTier::ExtraLegroom => "Extra Legroom",
            SeatTier::Standard => "Standard",
        }
    }
}

pub fn seat_price(label: &SeatLabel) -> u32 {
    SeatTier::for_row(label.row()).surcharge()
}

/// Sum of seat surcharges for one leg.
pub fn seats_total(seats: &[SeatLabel]) -> u32 {
    seats.iter().map(seat_price).sum()
}

/// Optional extras purchasable with a booking. Priced once per booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOn {
    Meal,
    #[serde(rename = "baggage")]
    ExtraBaggage,
    Wifi,
    #[serde(rename = "insurance")]
    TravelInsurance,
}

impl AddOn {
    pub const ALL: [AddOn; 4] = [AddOn::Meal, AddOn::ExtraBaggage, AddOn::Wifi, AddOn::TravelInsurance];

    pub fn price(self) -> u32 {
        match self {
            AddOn::Meal => 25,
            AddOn::ExtraBaggage => 45,
            AddOn::Wifi => 15,
            AddOn::TravelInsurance => 35,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AddOn::Meal => "In-Flight Meal",
            AddOn::ExtraBaggage => "Extra Baggage",
            AddOn::Wifi => "Wi-Fi Access",
            AddOn::TravelInsurance => "Travel Insurance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown add-on: {0}")]
pub struct UnknownAddOn(pub String);

impl FromStr for AddOn {
    type Err = UnknownAddOn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "meal" => Ok(AddOn::Meal),
            "baggage" => Ok(AddOn::ExtraBaggage),
            "wifi" => Ok(AddOn::Wifi),
            "insurance" => Ok(AddOn::TravelInsurance),
            other => Err(UnknownAddOn(other.to_string())),
        }
    }
}

/// Price breakdown for an itinerary: base fares, seat surcharges and add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    pub base_fare: f64,
    pub return_base_fare: f64,
    pub seat_price: u32,
    pub return_seat_price: u32,
    pub add_ons_price: u32,
    pub total: f64,
}

impl FareQuote {
    pub fn new(
        base_fare: f64,
        return_base_fare: Option<f64>,
        seats: &[SeatLabel],
        return_seats: &[SeatLabel],
        add_ons: &[AddOn],
    ) -> Self {
        let return_base_fare = return_base_fare.unwrap_or(0.0);
        let seat_price = seats_total(seats);
        let return_seat_price = seats_total(return_seats);

        // Selecting the same add-on twice does not charge twice.
        let mut unique: Vec<AddOn> = Vec::with_capacity(add_ons.len());
        for add_on in add_ons {
            if !unique.contains(add_on) {
                unique.push(*add_on);
            }
        }
        let add_ons_price = unique.iter().map(|a| a.price()).sum();

        let total = base_fare
            + return_base_fare
            + seat_price as f64
            + return_seat_price as f64
            + add_ons_price as f64;

        Self {
            base_fare,
            return_base_fare,
            seat_price,
            return_seat_price,
            add_ons_price,
            total,
        }
    }
}
