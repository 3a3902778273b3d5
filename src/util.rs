//! The pieces around the engine: a board that knows where the mines are, its
//! configuration, and a driver that lets an [`InferenceEngine`] play a game
//! on it.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use either::Either;
use rand::Rng;
use tracing::info;

use crate::internal_util::adjacent;
use crate::{Cell, Dimensions, Error, InferenceEngine, Result};

/// How to set up a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub dimensions: Dimensions,
    /// Number of mines to place
    pub mines: usize,
    /// Seed for mine placement and guesses; `None` draws one from the OS
    pub seed: Option<u64>,
}
impl GameConfig {
    /// # Errors
    ///
    /// If the board is empty, too large to count its cells, or too small to
    /// leave at least one cell free.
    pub fn validate(&self) -> Result<()> {
        let total_cells = self.dimensions.checked_total_cells().ok_or_else(|| {
            Error::Board(format!("board too large (got {})", self.dimensions))
        })?;
        if total_cells == 0 {
            return Err(Error::Board(format!(
                "board must have at least one cell (got {})",
                self.dimensions
            )));
        }
        if self.mines >= total_cells {
            return Err(Error::Board(format!(
                "{} mines leave no free cell on a {} board",
                self.mines, self.dimensions
            )));
        }
        Ok(())
    }

    /// Read `height width mines [seed]`; missing trailing values keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// If a value is not a number, there are too many values, or the result
    /// fails [`validate`](Self::validate).
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
            value
                .parse()
                .map_err(|_| Error::Board(format!("{name} must be a number, got {value:?}")))
        }

        let args = args.into_iter().collect::<Vec<_>>();
        if args.len() > 4 {
            return Err(Error::Board(format!(
                "expected at most 4 arguments (height width mines seed), got {}",
                args.len()
            )));
        }
        let mut config = Self::default();
        if let Some(height) = args.first() {
            config.dimensions.height = parse("height", height)?;
        }
        if let Some(width) = args.get(1) {
            config.dimensions.width = parse("width", width)?;
        }
        if let Some(mines) = args.get(2) {
            config.mines = parse("mines", mines)?;
        }
        if let Some(seed) = args.get(3) {
            config.seed = Some(parse("seed", seed)?);
        }
        config.validate()?;
        Ok(config)
    }
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::default(),
            mines: 8,
            seed: None,
        }
    }
}

/// Ground truth for a game: where the mines are. Knows nothing about what
/// has been revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    mines: HashSet<Cell>,
    dimensions: Dimensions,
}
impl Board {
    /// Create a board from an ASCII-encoded description, where:
    /// - `*` is a mine
    /// - `.`, `x` or a digit `0`-`8` is a cell without a mine (digits are
    ///   accepted so revealed boards can be pasted in; the counts are
    ///   recomputed)
    /// - Trailing or leading whitespace is ignored
    ///
    /// # Errors
    ///
    /// If the board is not rectangular, or has a width or height of 0, an error
    /// is returned.
    pub fn new(encoded: &str) -> Result<Self> {
        let lines = encoded.trim().lines().map(str::trim).collect::<Vec<_>>();
        let height = lines.len();
        let width = lines.first().map_or(0, |line| line.len());
        if height == 0 || width == 0 {
            return Err(Error::Board("board must have at least one cell".to_string()));
        }
        if let Some(line) = lines.iter().find(|l| l.len() != width) {
            return Err(Error::Board(format!(
                concat!(
                    "board must be rectangular (found line with length {},",
                    " expected length {})",
                ),
                line.len(),
                width,
            )));
        }
        let mut mines = HashSet::new();
        for (row, line) in lines.into_iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                match c {
                    '*' => {
                        mines.insert(Cell::new(row, col));
                    },
                    '.' | 'x' | '0'..='8' => (),
                    _ => {
                        return Err(Error::Board(format!(
                            "invalid character '{c}' at ({row}, {col})"
                        )));
                    },
                }
            }
        }
        Ok(Self {
            mines,
            dimensions: Dimensions::new(height, width),
        })
    }

    /// Place `config.mines` mines uniformly at random.
    ///
    /// # Errors
    ///
    /// If `config` fails [`GameConfig::validate`].
    pub fn random<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let Dimensions {
            height,
            width,
        } = config.dimensions;
        let mut mines = HashSet::with_capacity(config.mines);
        while mines.len() != config.mines {
            mines.insert(Cell::new(rng.gen_range(0..height), rng.gen_range(0..width)));
        }
        Ok(Self {
            mines,
            dimensions: config.dimensions,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines among the on-board neighbours of `cell`
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        adjacent(cell, self.dimensions)
            .filter(|neighbour| self.mines.contains(neighbour))
            .count()
    }

    /// Have exactly the mines been flagged?
    pub fn won(&self, flagged: &HashSet<Cell>) -> bool {
        *flagged == self.mines
    }

    /// Has every mine-free cell been revealed?
    pub fn cleared(&self, revealed: &HashSet<Cell>) -> bool {
        revealed.len() == self.dimensions.total_cells() - self.mines.len()
            && revealed.is_disjoint(&self.mines)
    }
}
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(2 * self.dimensions.width + 1);
        for row in 0..self.dimensions.height {
            writeln!(f, "{rule}")?;
            for col in 0..self.dimensions.width {
                let mark = if self.is_mine(Cell::new(row, col)) { 'X' } else { ' ' };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{rule}")
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    /// Played the given cell, which was a mine
    Lost(Cell),
    /// No move left to make without the board being won
    Stuck,
}

/// The end state of a game played by [`play`].
#[derive(Debug, Clone)]
pub struct Game {
    pub outcome: Outcome,
    pub engine: InferenceEngine,
    /// Moves made without a known-safe cell to play
    pub guesses: usize,
}

/// Let an engine play `board` to the end: a known-safe cell whenever there is
/// one, a random guess otherwise.
///
/// # Errors
///
/// Any error the engine reports; against a [`Board`] this means the engine
/// reasoned itself into a contradiction.
pub fn play<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Result<Game> {
    let mut engine = InferenceEngine::new(board.dimensions());
    let mut guesses = 0;
    let outcome = loop {
        if board.won(engine.mines()) || board.cleared(engine.moves_made()) {
            break Outcome::Won;
        }
        let cell = match engine.next_move(rng) {
            Some(Either::Left(cell)) => {
                info!(%cell, "making safe move");
                cell
            },
            Some(Either::Right(cell)) => {
                guesses += 1;
                info!(%cell, "no known safe moves, guessing");
                cell
            },
            None => break Outcome::Stuck,
        };
        if board.is_mine(cell) {
            info!(%cell, "hit a mine");
            break Outcome::Lost(cell);
        }
        engine.add_knowledge(cell, board.nearby_mines(cell))?;
    };
    info!(
        ?outcome,
        guesses,
        moves = engine.moves_made().len(),
        mines_found = engine.mines().len(),
        "game over"
    );
    Ok(Game {
        outcome,
        engine,
        guesses,
    })
}
