//! Fleet layouts: validating submitted placements and generating random ones.

use alloc::vec::Vec;

use rand::Rng;

use crate::common::{Coord, GridError, Orientation};
use crate::config::GRID_SIZE;
use crate::grid::Grid;
use crate::ship::Ship;

/// One ship of a submitted layout.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipLayout {
    pub id: u32,
    pub cells: Vec<Coord>,
}

/// A player-submitted fleet. `cells`, when present, is the occupancy grid the
/// client drew (non-zero = ship) and must agree with the ship list.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ManualPlacement {
    pub cells: Option<[[u8; GRID_SIZE]; GRID_SIZE]>,
    pub ships: Vec<ShipLayout>,
}

/// How a side's grid gets populated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PlacementSpec {
    Auto,
    Manual(ManualPlacement),
}

/// Errors returned while building a fleet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("cell ({x}, {y}) is claimed by ships {first} and {second}")]
    SharedCell {
        x: usize,
        y: usize,
        first: u32,
        second: u32,
    },
    #[error("fleet lengths {actual:?} do not match {expected:?}")]
    FleetMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("occupancy grid disagrees with ship list at ({x}, {y})")]
    CellsMismatch { x: usize, y: usize },
    #[error("could not fit a ship of length {length} after {attempts} attempts")]
    IllegalFleetState { length: usize, attempts: usize },
}

fn sorted_desc(lengths: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut v: Vec<usize> = lengths.collect();
    v.sort_unstable_by(|a, b| b.cmp(a));
    v
}

/// Validate a submitted layout against `fleet` and build the grid.
///
/// The ship partitioning is trusted (ships need not be straight), but every
/// cell must be on the board, no cell may belong to two ships, and the ship
/// lengths must match the fleet as a multiset.
pub fn validate_manual(spec: &ManualPlacement, fleet: &[usize]) -> Result<Grid, PlacementError> {
    let mut owner = [[None::<u32>; GRID_SIZE]; GRID_SIZE];
    for layout in &spec.ships {
        if layout.cells.is_empty() {
            return Err(GridError::EmptyShip(layout.id).into());
        }
        for &c in &layout.cells {
            if !c.in_bounds() {
                return Err(GridError::OutOfBounds { x: c.x, y: c.y }.into());
            }
            match owner[c.x][c.y] {
                Some(first) if first != layout.id => {
                    return Err(PlacementError::SharedCell {
                        x: c.x,
                        y: c.y,
                        first,
                        second: layout.id,
                    })
                }
                Some(_) => return Err(GridError::Overlap { x: c.x, y: c.y }.into()),
                None => owner[c.x][c.y] = Some(layout.id),
            }
        }
    }

    let expected = sorted_desc(fleet.iter().copied());
    let actual = sorted_desc(spec.ships.iter().map(|s| s.cells.len()));
    if expected != actual {
        return Err(PlacementError::FleetMismatch { expected, actual });
    }

    if let Some(cells) = &spec.cells {
        for x in 0..GRID_SIZE {
            for y in 0..GRID_SIZE {
                if (cells[x][y] != 0) != owner[x][y].is_some() {
                    return Err(PlacementError::CellsMismatch { x, y });
                }
            }
        }
    }

    let mut grid = Grid::new();
    for layout in &spec.ships {
        grid.place_ship(Ship::from_cells(layout.id, layout.cells.clone())?)?;
    }
    Ok(grid)
}

/// `true` if any cell in the 1-cell border around `ship` (diagonals included)
/// already holds part of another ship.
fn touches_other_ship(grid: &Grid, ship: &Ship) -> bool {
    ship.cells().iter().any(|c| {
        let rows = c.x.saturating_sub(1)..=(c.x + 1).min(GRID_SIZE - 1);
        rows.into_iter().any(|x| {
            let cols = c.y.saturating_sub(1)..=(c.y + 1).min(GRID_SIZE - 1);
            cols.into_iter()
                .any(|y| grid.cell(Coord::new(x, y)).is_some_and(|cell| cell.ship_id.is_some()))
        })
    })
}

/// Returns a random position for a ship of `length` that fits on `grid`,
/// does not overlap, and (with `no_touching`) keeps clear of other ships.
pub fn random_placement<R: Rng + ?Sized>(
    grid: &Grid,
    rng: &mut R,
    id: u32,
    length: usize,
    no_touching: bool,
    max_attempts: usize,
) -> Result<Ship, PlacementError> {
    if length == 0 {
        return Err(GridError::EmptyShip(id).into());
    }
    if length > GRID_SIZE {
        return Err(GridError::OutOfBounds { x: 0, y: length - 1 }.into());
    }
    for _ in 0..max_attempts {
        let orient = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let max_x = match orient {
            Orientation::Vertical => GRID_SIZE - length,
            Orientation::Horizontal => GRID_SIZE - 1,
        };
        let max_y = match orient {
            Orientation::Horizontal => GRID_SIZE - length,
            Orientation::Vertical => GRID_SIZE - 1,
        };
        let origin = Coord::new(rng.random_range(0..=max_x), rng.random_range(0..=max_y));
        let ship = Ship::lay(id, origin, orient, length)?;
        let free = ship
            .cells()
            .iter()
            .all(|&c| grid.cell(c).is_some_and(|cell| cell.ship_id.is_none()));
        if free && !(no_touching && touches_other_ship(grid, &ship)) {
            return Ok(ship);
        }
    }
    Err(PlacementError::IllegalFleetState {
        length,
        attempts: max_attempts,
    })
}

/// Generate a grid holding `fleet`, ship ids `1..=fleet.len()` in order.
///
/// Fails with [`PlacementError::IllegalFleetState`] when a ship cannot be
/// fitted; the caller should start over with a fresh grid.
pub fn auto_place<R: Rng + ?Sized>(
    rng: &mut R,
    fleet: &[usize],
    no_touching: bool,
    max_attempts: usize,
) -> Result<Grid, PlacementError> {
    let mut grid = Grid::new();
    for (i, &length) in fleet.iter().enumerate() {
        let ship = random_placement(&grid, rng, i as u32 + 1, length, no_touching, max_attempts)?;
        grid.place_ship(ship)?;
    }
    log::debug!("auto-placed fleet of {} ships", fleet.len());
    Ok(grid)
}
