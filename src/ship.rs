//! Ships: an id, the cells they cover, and a sunk flag.

use alloc::vec::Vec;

use crate::common::{Coord, GridError, Orientation};
use crate::config::GRID_SIZE;

/// A ship placed on the grid.
///
/// `sunk` is maintained by [`Grid::shoot`](crate::Grid::shoot); a ship never
/// tracks its own hits, the owning grid's cell states do.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    id: u32,
    length: usize,
    cells: Vec<Coord>,
    sunk: bool,
}

impl Ship {
    /// Lay a straight ship of `length` starting at `origin`.
    pub fn lay(
        id: u32,
        origin: Coord,
        orientation: Orientation,
        length: usize,
    ) -> Result<Self, GridError> {
        if length == 0 {
            return Err(GridError::EmptyShip(id));
        }
        let Coord { x, y } = origin;
        // Ensure placement fits within the grid
        let (along, across) = match orientation {
            Orientation::Horizontal => (y, x),
            Orientation::Vertical => (x, y),
        };
        if along >= GRID_SIZE || across >= GRID_SIZE || length > GRID_SIZE - along {
            let end = along.saturating_add(length - 1);
            return Err(match orientation {
                Orientation::Horizontal => GridError::OutOfBounds { x, y: end },
                Orientation::Vertical => GridError::OutOfBounds { x: end, y },
            });
        }
        let cells = (0..length)
            .map(|i| match orientation {
                Orientation::Horizontal => Coord::new(x, y + i),
                Orientation::Vertical => Coord::new(x + i, y),
            })
            .collect();
        Ok(Self {
            id,
            length,
            cells,
            sunk: false,
        })
    }

    /// Build a ship from an explicit cell list. Cells are taken as given; the
    /// grid checks bounds and overlap when the ship is placed.
    pub fn from_cells(id: u32, cells: Vec<Coord>) -> Result<Self, GridError> {
        if cells.is_empty() {
            return Err(GridError::EmptyShip(id));
        }
        Ok(Self {
            id,
            length: cells.len(),
            cells,
            sunk: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn is_sunk(&self) -> bool {
        self.sunk
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    pub(crate) fn set_sunk(&mut self, sunk: bool) {
        self.sunk = sunk;
    }
}
