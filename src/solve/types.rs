use std::collections::HashSet;
use std::fmt;

use frozenset::FrozenSet;
use itertools::Itertools;

use crate::{Cell, Error, Result};

/// Size of the board the engine reasons about.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub height: usize,
    pub width: usize,
}
impl Dimensions {
    pub const fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
        }
    }

    /// Is `cell` on the board?
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Number of cells on the board; `None` if that does not fit in a
    /// `usize`.
    pub fn checked_total_cells(&self) -> Option<usize> {
        self.height.checked_mul(self.width)
    }

    /// Number of cells on the board.
    ///
    /// Panics on overflow; only call this on dimensions that have been
    /// validated (see [`checked_total_cells`](Self::checked_total_cells)).
    pub fn total_cells(&self) -> usize {
        self.height * self.width
    }
}
impl Default for Dimensions {
    fn default() -> Self {
        Self::new(8, 8)
    }
}
impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Equality and hashing are structural, so two sentences built from different
/// observations but describing the same constraint are the same sentence.
///
/// Always satisfies `count <= cells.len()`; in particular a sentence over no
/// cells has a count of zero.
pub struct Sentence {
    cells: FrozenSet<Cell>,
    count: usize,
}
impl Sentence {
    /// # Errors
    ///
    /// [`Error::Contradiction`] if `count` exceeds the number of cells.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self> {
        let cells: FrozenSet<Cell> = cells.into_iter().collect();
        if cells.is_empty() && count != 0 {
            return Err(Error::Contradiction("sentence over no cells with mines"));
        }
        if count > cells.len() {
            return Err(Error::Contradiction("sentence with more mines than cells"));
        }
        Ok(Self {
            cells,
            count,
        })
    }

    pub fn cells(&self) -> &FrozenSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells that must all be mines: every cell, when the count covers them
    /// all. An empty sentence knows of no mines.
    pub fn known_mines(&self) -> HashSet<Cell> {
        if self.count > 0 && self.count == self.cells.len() {
            self.cells.iter().copied().collect()
        } else {
            HashSet::new()
        }
    }

    /// Cells that must all be safe: every cell, when the count is zero.
    pub fn known_safes(&self) -> HashSet<Cell> {
        if self.count == 0 {
            self.cells.iter().copied().collect()
        } else {
            HashSet::new()
        }
    }

    /// Is everything this sentence says already captured by
    /// [`known_mines`](Self::known_mines) and [`known_safes`](Self::known_safes)?
    pub fn is_resolved(&self) -> bool {
        self.count == 0 || self.count == self.cells.len()
    }

    /// Forget `cell`, which is known to be a mine. No-op if the cell is not
    /// part of this sentence.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if the sentence contains `cell` but claims no
    /// mines.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<()> {
        if !self.cells.contains(&cell) {
            return Ok(());
        }
        if self.count == 0 {
            return Err(Error::Contradiction("mine found among cells known to be safe"));
        }
        self.cells = self.without(cell);
        self.count -= 1;
        Ok(())
    }

    /// Forget `cell`, which is known to be safe. No-op if the cell is not
    /// part of this sentence.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if every cell of the sentence was a mine.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<()> {
        if !self.cells.contains(&cell) {
            return Ok(());
        }
        if self.count == self.cells.len() {
            return Err(Error::Contradiction("safe cell found among cells known to be mines"));
        }
        self.cells = self.without(cell);
        Ok(())
    }

    fn without(&self, cell: Cell) -> FrozenSet<Cell> {
        self.cells.iter().copied().filter(|&c| c != cell).collect()
    }

    /// Is this sentence's cell set contained in `other`'s? Equal cell sets
    /// count as subsets.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// Given `subset`, whose cells all belong to this sentence, return the
    /// sentence describing the remaining cells.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if the two sentences cannot both hold; e.g.
    /// identical cell sets with different counts, or a subset claiming more
    /// mines than this sentence.
    pub fn subtract(&self, subset: &Self) -> Result<Self> {
        debug_assert!(subset.is_subset_of(self));
        let count = self
            .count
            .checked_sub(subset.count)
            .ok_or(Error::Contradiction("subset sentence with more mines than its superset"))?;
        Self::new(self.cells.difference(&subset.cells).copied(), count)
    }
}
impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} = {}",
            self.cells.iter().sorted().join(", "),
            self.count
        )
    }
}
