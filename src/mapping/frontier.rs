//! Frontier tracking: the Ground cell furthest from the mapping origin

use crate::common::CellCoord;

/// Running maximum over Ground registrations.
///
/// Updated in O(1) per new Ground cell. The first cell to reach a given
/// distance keeps the frontier; equal distances do not replace it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontierTracker {
    cell: Option<CellCoord>,
    distance_sq: f64,
}

impl FrontierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frontier cell, if any Ground cell has been registered.
    pub fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    /// Squared distance of the frontier from the origin (0 when empty).
    pub fn distance_sq(&self) -> f64 {
        self.distance_sq
    }

    /// Offer a newly registered Ground cell. Returns true if it became the
    /// frontier.
    pub fn observe(&mut self, cell: CellCoord, distance_sq: f64) -> bool {
        if self.cell.is_none() || distance_sq > self.distance_sq {
            self.cell = Some(cell);
            self.distance_sq = distance_sq;
            return true;
        }
        false
    }

    /// Rebuild from scratch over `candidates`. Ties go to the smallest
    /// coordinate so the result does not depend on iteration order.
    pub fn rebuild<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = (CellCoord, f64)>,
    {
        self.clear();
        for (cell, distance_sq) in candidates {
            let better = match self.cell {
                None => true,
                Some(best) => {
                    distance_sq > self.distance_sq
                        || (distance_sq == self.distance_sq && cell < best)
                }
            };
            if better {
                self.cell = Some(cell);
                self.distance_sq = distance_sq;
            }
        }
    }

    pub fn clear(&mut self) {
        self.cell = None;
        self.distance_sq = 0.0;
    }
}
