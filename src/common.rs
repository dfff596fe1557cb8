//! Common types for the grid model: coordinates, shot outcomes and grid errors.

use core::fmt;

use crate::config::GRID_SIZE;

/// A cell address. `x` is the row, `y` the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(self) -> bool {
        self.x < GRID_SIZE && self.y < GRID_SIZE
    }

    /// Orthogonal neighbours that lie on the board.
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        let Coord { x, y } = self;
        [
            x.checked_sub(1).map(|r| Coord::new(r, y)),
            x.checked_add(1).map(|r| Coord::new(r, y)),
            y.checked_sub(1).map(|c| Coord::new(x, c)),
            y.checked_add(1).map(|c| Coord::new(x, c)),
        ]
        .into_iter()
        .flatten()
        .filter(|c| c.in_bounds())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Ship grows along `y`.
    Horizontal,
    /// Ship grows along `x`.
    Vertical,
}

/// Result of a single shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShotOutcome {
    pub hit: bool,
    pub sunk: bool,
    /// The cell had been shot before; nothing changed.
    pub already_shot: bool,
}

impl ShotOutcome {
    pub const MISS: Self = Self {
        hit: false,
        sunk: false,
        already_shot: false,
    };
    pub const ALREADY_SHOT: Self = Self {
        hit: false,
        sunk: false,
        already_shot: true,
    };

    pub const fn hit(sunk: bool) -> Self {
        Self {
            hit: true,
            sunk,
            already_shot: false,
        }
    }
}

/// Errors returned by grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) is off the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("cell ({x}, {y}) is already occupied")]
    Overlap { x: usize, y: usize },
    #[error("ship id {0} is already on the board")]
    DuplicateShipId(u32),
    #[error("ship {0} has no cells")]
    EmptyShip(u32),
    #[error("grid state is inconsistent: {0}")]
    Corrupt(&'static str),
}
