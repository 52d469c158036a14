use serde::Serialize;
use std::collections::BTreeSet;

use crate::pricing::SeatTier;
use crate::seat::{SeatLabel, ROWS, SEATS_PER_ROW};
use crate::selection::SeatSelection;

/// Seats before the aisle. Display only.
pub const AISLE_AFTER: u8 = 3;

/// Fixed single-aisle cabin geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CabinLayout {
    pub rows: u8,
    pub seats_per_row: u8,
    pub aisle_after: u8,
}

impl CabinLayout {
    pub fn standard() -> Self {
        Self {
            rows: ROWS,
            seats_per_row: SEATS_PER_ROW,
            aisle_after: AISLE_AFTER,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.seats_per_row as usize
    }

    /// Every seat in row-major order, 1A through 30F.
    pub fn labels(&self) -> impl Iterator<Item = SeatLabel> + '_ {
        (0..self.rows as usize).flat_map(move |row| {
            (0..self.seats_per_row as usize).filter_map(move |seat| SeatLabel::from_indices(row, seat))
        })
    }

    pub fn contains(&self, label: &SeatLabel) -> bool {
        label.row() <= self.rows && label.column().index() < self.seats_per_row as usize
    }
}

impl Default for CabinLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// One rendered seat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatView {
    pub label: SeatLabel,
    pub tier: SeatTier,
    pub tier_name: &'static str,
    pub price: u32,
    /// Borders the aisle.
    pub aisle: bool,
    pub occupied: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatRow {
    pub row: u8,
    /// Seats left of the aisle (A-C)
    pub left: Vec<SeatView>,
    /// Seats right of the aisle (D-F)
    pub right: Vec<SeatView>,
}

/// Cabin as shown to a passenger picking seats for one leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatMap {
    pub rows: Vec<SeatRow>,
    pub available: usize,
    pub occupied: usize,
    pub selected: Vec<SeatLabel>,
    pub selection_surcharge: u32,
}

impl SeatMap {
    pub fn build(
        layout: &CabinLayout,
        occupied: &BTreeSet<SeatLabel>,
        selection: &SeatSelection,
    ) -> Self {
        let mut rows: Vec<SeatRow> = Vec::with_capacity(layout.rows as usize);
        let mut occupied_count = 0;

        for label in layout.labels() {
            let tier = SeatTier::for_row(label.row());
            let is_occupied = occupied.contains(&label);
            if is_occupied {
                occupied_count += 1;
            }

            let view = SeatView {
                label,
                tier,
                tier_name: tier.display_name(),
                price: tier.surcharge(),
                aisle: label.column().is_aisle_side(),
                occupied: is_occupied,
                selected: selection.contains(&label),
            };

            if rows.last().map(|r| r.row) != Some(label.row()) {
                rows.push(SeatRow {
                    row: label.row(),
                    left: Vec::new(),
                    right: Vec::new(),
                });
            }
            if let Some(row) = rows.last_mut() {
                if label.column().index() < layout.aisle_after as usize {
                    row.left.push(view);
                } else {
                    row.right.push(view);
                }
            }
        }

        Self {
            rows,
            available: layout.capacity() - occupied_count,
            occupied: occupied_count,
            selected: selection.seats().to_vec(),
            selection_surcharge: selection.surcharge(),
        }
    }
}
