//! Registry of externally classified detections (rocks and similar)

use std::collections::HashMap;

use crate::common::CellCoord;

/// A labelled landmark cell
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub cell: CellCoord,
    pub label: String,
}

/// Landmark cells in registration order, with O(1) membership.
#[derive(Debug, Clone, Default)]
pub struct LandmarkRegistry {
    entries: Vec<Landmark>,
    lookup: HashMap<CellCoord, usize>,
}

impl LandmarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a landmark. The first label registered for a cell is kept;
    /// returns false if the cell was already a landmark.
    pub fn insert(&mut self, cell: CellCoord, label: String) -> bool {
        if self.lookup.contains_key(&cell) {
            return false;
        }
        self.lookup.insert(cell, self.entries.len());
        self.entries.push(Landmark { cell, label });
        true
    }

    pub fn contains(&self, cell: &CellCoord) -> bool {
        self.lookup.contains_key(cell)
    }

    pub fn label(&self, cell: &CellCoord) -> Option<&str> {
        self.lookup
            .get(cell)
            .map(|&i| self.entries[i].label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.entries.iter()
    }

    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.entries.iter().map(|l| l.cell)
    }

    /// Number of landmarks carrying `label`.
    pub fn count_label(&self, label: &str) -> usize {
        self.entries.iter().filter(|l| l.label == label).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookup.clear();
    }
}
