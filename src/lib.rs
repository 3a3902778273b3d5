//! Knowledge-based minesweeper solver.
//!
//! Observations of the form "this cell is safe and has N mined neighbours" are
//! folded into a knowledge base of [`Sentence`]s. The [`InferenceEngine`]
//! derives new sentences by subset difference, resolves fully-determined
//! sentences into certainly-safe and certainly-mined cells, and repeats until
//! nothing new can be learned.
//!
//! ```
//! use minesweeper_kb::{Cell, Dimensions, InferenceEngine};
//!
//! let mut engine = InferenceEngine::new(Dimensions::new(8, 8));
//! engine.add_knowledge(Cell::new(1, 1), 0).unwrap();
//! assert!(engine.safes().contains(&Cell::new(0, 0)));
//! assert_eq!(engine.safe_move(), Some(Cell::new(0, 0)));
//! ```
use std::fmt;

mod internal_util;
mod solve;
pub mod util;

pub use solve::{CertaintySets, Dimensions, InferenceEngine, KnowledgeBase, Sentence};

/// A board coordinate; ordered by row, then column.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}
impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
        }
    }
}
impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Everything that can go wrong while reasoning about a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The accumulated observations cannot all hold for a single mine
    /// layout. Not recoverable; the engine that reported it should be
    /// discarded.
    #[error("inconsistent knowledge: {0}")]
    Contradiction(&'static str),
    #[error("cell {cell} is outside the {dimensions} board")]
    OffBoard { cell: Cell, dimensions: Dimensions },
    #[error("invalid board: {0}")]
    Board(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
