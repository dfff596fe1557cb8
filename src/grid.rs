//! One player's 10×10 board: cell states, ship list, shot resolution.

use alloc::vec::Vec;
use core::fmt;

use crate::common::{Coord, GridError, Orientation, ShotOutcome};
use crate::config::GRID_SIZE;
use crate::ship::Ship;

/// State of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum CellState {
    #[default]
    Empty,
    Ship,
    Hit,
    Miss,
}

impl CellState {
    /// `true` once the cell has received a shot.
    pub fn is_shot(self) -> bool {
        matches!(self, CellState::Hit | CellState::Miss)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub state: CellState,
    /// Owning ship, set for `Ship` and `Hit` cells only.
    pub ship_id: Option<u32>,
}

/// What a viewer sees in one cell. The discriminants are the stable render
/// codes handed to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CellView {
    /// Water, or a ship the viewer may not see.
    #[default]
    Empty = 0,
    Ship = 1,
    Hit = 2,
    Miss = 3,
}

impl CellView {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Rendered board, indexed `[x][y]`.
pub type BoardView = [[CellView; GRID_SIZE]; GRID_SIZE];

/// Main grid state: cells plus the ships that own them.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
    ships: Vec<Ship>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create an empty grid (no ships placed).
    pub fn new() -> Self {
        Self {
            cells: [[Cell::default(); GRID_SIZE]; GRID_SIZE],
            ships: Vec::new(),
        }
    }

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.cells.get(coord.x).and_then(|row| row.get(coord.y))
    }

    /// State at `coord`, or `None` when it is off the board.
    pub fn state_at(&self, coord: Coord) -> Option<CellState> {
        self.cell(coord).map(|c| c.state)
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship(&self, id: u32) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id() == id)
    }

    /// `true` once at least one ship has been placed.
    pub fn is_populated(&self) -> bool {
        !self.ships.is_empty()
    }

    /// Place a straight ship of `length` at (`x`, `y`).
    ///
    /// Fails if any covered cell is off the board or not empty. No adjacency
    /// rule is enforced here.
    pub fn place(
        &mut self,
        ship_id: u32,
        x: usize,
        y: usize,
        orientation: Orientation,
        length: usize,
    ) -> Result<(), GridError> {
        let ship = Ship::lay(ship_id, Coord::new(x, y), orientation, length)?;
        self.place_ship(ship)
    }

    /// Place an already-built ship, writing its id into every covered cell.
    pub fn place_ship(&mut self, ship: Ship) -> Result<(), GridError> {
        if self.ship(ship.id()).is_some() {
            return Err(GridError::DuplicateShipId(ship.id()));
        }
        for (i, &c) in ship.cells().iter().enumerate() {
            if !c.in_bounds() {
                return Err(GridError::OutOfBounds { x: c.x, y: c.y });
            }
            // a ship listing the same cell twice overlaps itself
            if self.cells[c.x][c.y].state != CellState::Empty || ship.cells()[..i].contains(&c) {
                return Err(GridError::Overlap { x: c.x, y: c.y });
            }
        }
        for &c in ship.cells() {
            self.cells[c.x][c.y] = Cell {
                state: CellState::Ship,
                ship_id: Some(ship.id()),
            };
        }
        self.ships.push(ship);
        Ok(())
    }

    /// Process a shot at (`x`, `y`).
    ///
    /// A cell that was already shot yields `already_shot` and is left untouched.
    pub fn shoot(&mut self, x: usize, y: usize) -> Result<ShotOutcome, GridError> {
        let coord = Coord::new(x, y);
        if !coord.in_bounds() {
            return Err(GridError::OutOfBounds { x, y });
        }
        let cell = &mut self.cells[x][y];
        match cell.state {
            CellState::Hit | CellState::Miss => Ok(ShotOutcome::ALREADY_SHOT),
            CellState::Empty => {
                cell.state = CellState::Miss;
                Ok(ShotOutcome::MISS)
            }
            CellState::Ship => {
                cell.state = CellState::Hit;
                let Some(id) = cell.ship_id else {
                    return Err(GridError::Corrupt("ship cell without owner"));
                };
                let cells = &self.cells;
                let ship = self
                    .ships
                    .iter_mut()
                    .find(|s| s.id() == id)
                    .ok_or(GridError::Corrupt("ship cell points at unknown ship"))?;
                let sunk = ship
                    .cells()
                    .iter()
                    .all(|c| cells[c.x][c.y].state == CellState::Hit);
                ship.set_sunk(sunk);
                Ok(ShotOutcome::hit(sunk))
            }
        }
    }

    /// `true` when every ship is sunk. An empty grid counts as all sunk.
    pub fn all_sunk(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }

    /// Cells that have not been shot yet, in row-major order.
    pub fn unshot(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..GRID_SIZE)
            .flat_map(|x| (0..GRID_SIZE).map(move |y| Coord::new(x, y)))
            .filter(|c| !self.cells[c.x][c.y].state.is_shot())
    }

    /// Render the board. With `reveal_ships` off, intact ship cells look like
    /// water; hits and misses are always shown.
    pub fn render(&self, reveal_ships: bool) -> BoardView {
        let mut view = [[CellView::Empty; GRID_SIZE]; GRID_SIZE];
        for (x, row) in self.cells.iter().enumerate() {
            for (y, cell) in row.iter().enumerate() {
                view[x][y] = match cell.state {
                    CellState::Empty => CellView::Empty,
                    CellState::Ship if reveal_ships => CellView::Ship,
                    CellState::Ship => CellView::Empty,
                    CellState::Hit => CellView::Hit,
                    CellState::Miss => CellView::Miss,
                };
            }
        }
        view
    }

    /// Encode the grid as a bincode blob.
    #[cfg(feature = "std")]
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serialize(&GridState::from(self))?)
    }

    /// Decode and validate a blob produced by [`Grid::to_bytes`].
    #[cfg(feature = "std")]
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let state: GridState = bincode::deserialize(bytes)?;
        Ok(Grid::try_from(state)?)
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {{")?;
        for row in &self.cells {
            write!(f, "  ")?;
            for cell in row {
                let ch = match cell.state {
                    CellState::Empty => '.',
                    CellState::Ship => 'S',
                    CellState::Hit => 'X',
                    CellState::Miss => 'o',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        write!(f, "  ships: {:?}\n}}", self.ships)
    }
}

/// Flat, serializable grid for storage: 100 cells in row-major order plus
/// the ship list with sunk flags.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GridState {
    pub cells: Vec<Cell>,
    pub ships: Vec<Ship>,
}

impl From<&Grid> for GridState {
    fn from(g: &Grid) -> Self {
        GridState {
            cells: g.cells.iter().flatten().copied().collect(),
            ships: g.ships.clone(),
        }
    }
}

impl TryFrom<GridState> for Grid {
    type Error = GridError;

    fn try_from(state: GridState) -> Result<Self, Self::Error> {
        if state.cells.len() != GRID_SIZE * GRID_SIZE {
            return Err(GridError::Corrupt("wrong cell count"));
        }
        let mut cells = [[Cell::default(); GRID_SIZE]; GRID_SIZE];
        for (i, cell) in state.cells.into_iter().enumerate() {
            let owned = matches!(cell.state, CellState::Ship | CellState::Hit);
            if owned != cell.ship_id.is_some() {
                return Err(GridError::Corrupt("cell ownership disagrees with its state"));
            }
            cells[i / GRID_SIZE][i % GRID_SIZE] = cell;
        }

        let mut claimed = 0usize;
        for (i, ship) in state.ships.iter().enumerate() {
            if ship.cells().is_empty() || ship.length() != ship.cells().len() {
                return Err(GridError::Corrupt("ship length disagrees with its cells"));
            }
            if state.ships[..i].iter().any(|s| s.id() == ship.id()) {
                return Err(GridError::DuplicateShipId(ship.id()));
            }
            let mut all_hit = true;
            for &c in ship.cells() {
                if !c.in_bounds() {
                    return Err(GridError::OutOfBounds { x: c.x, y: c.y });
                }
                let cell = cells[c.x][c.y];
                if cell.ship_id != Some(ship.id()) {
                    return Err(GridError::Corrupt("ship cell not owned by its ship"));
                }
                all_hit &= cell.state == CellState::Hit;
            }
            if all_hit != ship.is_sunk() {
                return Err(GridError::Corrupt("sunk flag disagrees with cell states"));
            }
            claimed += ship.length();
        }
        let owned = cells
            .iter()
            .flatten()
            .filter(|c| c.ship_id.is_some())
            .count();
        if owned != claimed {
            return Err(GridError::Corrupt("owned cells not covered by the ship list"));
        }

        Ok(Grid {
            cells,
            ships: state.ships,
        })
    }
}
