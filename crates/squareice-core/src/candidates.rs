//! Tracking of the positions where a legal move currently exists.
//!
//! Entries live in a dense vector so a uniform pick is one draw; a per-cell
//! slot index gives O(1) insert, update and swap-remove. After a move only
//! positions whose predicate reads one of the four mutated cells can change,
//! and those are re-evaluated in place.

use crate::flip::{Direction, Plaquette, can_flip};
use crate::lattice::Lattice;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

const NO_SLOT: u32 = u32::MAX;

/// Upper bound on positions re-evaluated after one move: three per
/// mutated cell.
pub const MAX_FOOTPRINT: usize = 12;

/// A position with at least one legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlippableEntry {
    pub row: usize,
    pub col: usize,
    pub can_flip_up: bool,
    pub can_flip_down: bool,
}

impl FlippableEntry {
    /// Evaluate both predicates at `(row, col)`.
    pub fn evaluate(lattice: &Lattice, row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            can_flip_up: can_flip(lattice, row, col, Direction::Up),
            can_flip_down: can_flip(lattice, row, col, Direction::Down),
        }
    }

    pub fn any(&self) -> bool {
        self.can_flip_up || self.can_flip_down
    }

    /// Both orientations are available (a heat-bath site).
    pub fn is_biflip(&self) -> bool {
        self.can_flip_up && self.can_flip_down
    }

    pub fn can_flip(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.can_flip_up,
            Direction::Down => self.can_flip_down,
        }
    }
}

/// The candidate set of a lattice.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    width: usize,
    height: usize,
    entries: Vec<FlippableEntry>,
    slots: Vec<u32>,
}

impl CandidateSet {
    /// Full O(N²) scan.
    pub fn build(lattice: &Lattice) -> Self {
        let mut set = Self {
            width: lattice.width(),
            height: lattice.height(),
            entries: Vec::new(),
            slots: vec![NO_SLOT; lattice.len()],
        };
        for row in 0..lattice.height() {
            for col in 0..lattice.width() {
                let entry = FlippableEntry::evaluate(lattice, row, col);
                if entry.any() {
                    set.insert(entry);
                }
            }
        }
        set
    }

    /// Restore a set from entries in a previously captured order.
    ///
    /// Returns `None` if the entries do not describe the lattice exactly.
    pub fn from_entries(lattice: &Lattice, entries: Vec<FlippableEntry>) -> Option<Self> {
        let mut set = Self {
            width: lattice.width(),
            height: lattice.height(),
            entries: Vec::with_capacity(entries.len()),
            slots: vec![NO_SLOT; lattice.len()],
        };
        for entry in entries {
            if entry.row >= set.height || entry.col >= set.width || set.get(entry.row, entry.col).is_some() {
                return None;
            }
            set.insert(entry);
        }
        set.same_as(&Self::build(lattice)).then_some(set)
    }

    /// Re-evaluate every position whose legality can depend on the cells of
    /// `plaquette`.
    pub fn refresh_after(&mut self, lattice: &Lattice, plaquette: &Plaquette) {
        let (positions, len) = footprint(plaquette, self.width, self.height);
        for &(row, col) in &positions[..len] {
            self.refresh_position(lattice, row, col);
        }
    }

    /// Re-evaluate a single position and insert, update or remove its entry.
    pub fn refresh_position(&mut self, lattice: &Lattice, row: usize, col: usize) {
        let entry = FlippableEntry::evaluate(lattice, row, col);
        let idx = row * self.width + col;
        let slot = self.slots[idx];
        match (slot != NO_SLOT, entry.any()) {
            (true, true) => self.entries[slot as usize] = entry,
            (true, false) => self.remove_slot(idx),
            (false, true) => self.insert(entry),
            (false, false) => {}
        }
    }

    /// Pick one candidate uniformly. Consumes exactly one draw when the set
    /// is non-empty and none when it is empty.
    pub fn pick_uniform(&self, rng: &mut SimRng) -> Option<FlippableEntry> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries[rng.next_below(self.entries.len())])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&FlippableEntry> {
        if row >= self.height || col >= self.width {
            return None;
        }
        match self.slots[row * self.width + col] {
            NO_SLOT => None,
            slot => self.entries.get(slot as usize),
        }
    }

    /// Entries in internal (pick) order.
    pub fn entries(&self) -> &[FlippableEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlippableEntry> {
        self.entries.iter()
    }

    /// Entries sorted by position, for order-independent comparison.
    pub fn sorted_entries(&self) -> Vec<FlippableEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_unstable();
        sorted
    }

    /// Set equality, ignoring internal order.
    pub fn same_as(&self, other: &CandidateSet) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.len() == other.len()
            && self.iter().all(|e| other.get(e.row, e.col) == Some(e))
    }

    /// Number of positions where both orientations are available.
    pub fn biflip_count(&self) -> usize {
        self.iter().filter(|e| e.is_biflip()).count()
    }

    fn insert(&mut self, entry: FlippableEntry) {
        let idx = entry.row * self.width + entry.col;
        self.slots[idx] = self.entries.len() as u32;
        self.entries.push(entry);
    }

    fn remove_slot(&mut self, idx: usize) {
        let slot = self.slots[idx] as usize;
        self.slots[idx] = NO_SLOT;
        self.entries.swap_remove(slot);
        if let Some(moved) = self.entries.get(slot) {
            self.slots[moved.row * self.width + moved.col] = slot as u32;
        }
    }
}

/// Positions whose Up or Down predicate reads a cell of `plaquette`.
///
/// Up at `p` reads `p` and its upper-right; Down at `p` reads `p` and its
/// down-left. So a mutated cell `(i, j)` affects `(i, j)`, `(i + 1, j - 1)`
/// and `(i - 1, j + 1)`.
pub fn footprint(plaquette: &Plaquette, width: usize, height: usize) -> ([(usize, usize); MAX_FOOTPRINT], usize) {
    let mut out = [(0, 0); MAX_FOOTPRINT];
    let mut len = 0;
    let mut push = |pos: (usize, usize)| {
        if !out[..len].contains(&pos) {
            out[len] = pos;
            len += 1;
        }
    };
    for &(i, j) in &plaquette.cells {
        push((i, j));
        if j > 0 && i + 1 < height {
            push((i + 1, j - 1));
        }
        if i > 0 && j + 1 < width {
            push((i - 1, j + 1));
        }
    }
    (out, len)
}
