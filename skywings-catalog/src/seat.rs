use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of seat rows in the cabin.
pub const ROWS: u8 = 30;

/// Seats per row, lettered A through F.
pub const SEATS_PER_ROW: u8 = 6;

/// Seat column letter. Columns map to indices 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Column {
    pub const ALL: [Column; 6] = [Column::A, Column::B, Column::C, Column::D, Column::E, Column::F];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        Self::from_index((upper as u8 - b'A') as usize)
    }

    /// True for the two seats bordering the aisle (C and D).
    pub fn is_aisle_side(self) -> bool {
        matches!(self, Column::C | Column::D)
    }
}

/// A seat label such as `14D`: 1-based row followed by a column letter.
///
/// Ordering is row first, then column, so sets of labels iterate front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatLabel {
    row: u8,
    column: Column,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatLabelError {
    #[error("Seat label is empty")]
    Empty,

    #[error("Invalid seat row in '{0}'")]
    InvalidRow(String),

    #[error("Seat row {0} is outside the cabin (1-30)")]
    RowOutOfRange(u32),

    #[error("Invalid seat column in '{0}'")]
    InvalidColumn(String),

    #[error("Seat {0} listed more than once")]
    Duplicate(SeatLabel),
}

impl SeatLabel {
    pub fn new(row: u8, column: Column) -> Result<Self, SeatLabelError> {
        if row == 0 || row > ROWS {
            return Err(SeatLabelError::RowOutOfRange(row as u32));
        }
        Ok(Self { row, column })
    }

    /// Builds a label from 0-based grid coordinates.
    pub fn from_indices(row_index: usize, seat_index: usize) -> Option<Self> {
        let column = Column::from_index(seat_index)?;
        let row = u8::try_from(row_index + 1).ok()?;
        Self::new(row, column).ok()
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    /// 0-based row index, used for tier boundaries.
    pub fn row_index(&self) -> usize {
        (self.row - 1) as usize
    }

    pub fn column(&self) -> Column {
        self.column
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column.letter())
    }
}

impl FromStr for SeatLabel {
    type Err = SeatLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let letter = s.chars().last().ok_or(SeatLabelError::Empty)?;
        let digits = &s[..s.len() - letter.len_utf8()];

        let column = Column::from_letter(letter)
            .ok_or_else(|| SeatLabelError::InvalidColumn(s.to_string()))?;

        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SeatLabelError::InvalidRow(s.to_string()));
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| SeatLabelError::InvalidRow(s.to_string()))?;
        if row > ROWS as u32 {
            return Err(SeatLabelError::RowOutOfRange(row));
        }

        Self::new(row as u8, column)
    }
}

impl TryFrom<String> for SeatLabel {
    type Error = SeatLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatLabel> for String {
    fn from(label: SeatLabel) -> Self {
        label.to_string()
    }
}

/// Parses the comma-joined seat field stored on a booking leg (`"12C,12D"`).
///
/// Blank segments are skipped. At least one label is required and a label may
/// appear only once.
pub fn parse_seat_list(raw: &str) -> Result<Vec<SeatLabel>, SeatLabelError> {
    let mut seats: Vec<SeatLabel> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let label: SeatLabel = part.parse()?;
        if seats.contains(&label) {
            return Err(SeatLabelError::Duplicate(label));
        }
        seats.push(label);
    }

    if seats.is_empty() {
        return Err(SeatLabelError::Empty);
    }
    Ok(seats)
}

pub fn join_seats(seats: &[SeatLabel]) -> String {
    seats
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let label: SeatLabel = "14D".parse().unwrap();
        assert_eq!(label.row(), 14);
        assert_eq!(label.column(), Column::D);
        assert_eq!(label.row_index(), 13);
        assert_eq!(label.to_string(), "14D");

        let lower: SeatLabel = " 3a ".parse().unwrap();
        assert_eq!(lower.to_string(), "3A");
    }

    #[test]
    fn test_rejects_malformed_labels() {
        assert_eq!("".parse::<SeatLabel>(), Err(SeatLabelError::Empty));
        assert!(matches!("31A".parse::<SeatLabel>(), Err(SeatLabelError::RowOutOfRange(31))));
        assert!(matches!("0A".parse::<SeatLabel>(), Err(SeatLabelError::InvalidRow(_))));
        assert!(matches!("A".parse::<SeatLabel>(), Err(SeatLabelError::InvalidRow(_))));
        assert!(matches!("12G".parse::<SeatLabel>(), Err(SeatLabelError::InvalidColumn(_))));
        assert!(matches!("1-2C".parse::<SeatLabel>(), Err(SeatLabelError::InvalidRow(_))));
        assert!(matches!("12".parse::<SeatLabel>(), Err(SeatLabelError::InvalidColumn(_))));
    }

    #[test]
    fn test_seat_list_round_trip() {
        let seats = parse_seat_list("12C, 12D,,").unwrap();
        assert_eq!(seats.len(), 2);
        assert_eq!(join_seats(&seats), "12C,12D");

        assert_eq!(parse_seat_list(" , "), Err(SeatLabelError::Empty));
        assert!(matches!(parse_seat_list("1A,1A"), Err(SeatLabelError::Duplicate(_))));
    }

    #[test]
    fn test_ordering_is_front_to_back() {
        let mut seats = parse_seat_list("14D,3A,3B,12C").unwrap();
        seats.sort();
        assert_eq!(join_seats(&seats), "3A,3B,12C,14D");
    }

    #[test]
    fn test_serde_uses_label_string() {
        let label: SeatLabel = "5B".parse().unwrap();
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"5B\"");
        assert!(serde_json::from_str::<SeatLabel>("\"40B\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_grid_labels_parse_back(row in 0usize..30, seat in 0usize..6) {
            let label = SeatLabel::from_indices(row, seat).unwrap();
            let parsed: SeatLabel = label.to_string().parse().unwrap();
            prop_assert_eq!(parsed, label);
            prop_assert!((1..=30).contains(&parsed.row()));
            prop_assert!(('A'..='F').contains(&parsed.column().letter()));
        }

        #[test]
        fn prop_out_of_cabin_rows_rejected(row in 31u32..1000, letter in "[A-F]") {
            let raw = format!("{}{}", row, letter);
            prop_assert!(raw.parse::<SeatLabel>().is_err());
        }
    }
}
