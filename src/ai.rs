// Targeting heuristic for the scripted opponent.
// Stateless: hunt/target mode is re-derived from the grid on every call.

use alloc::vec::Vec;

use rand::Rng;

use crate::{
    common::{Coord, Orientation},
    config::{GRID_SIZE, TARGET_LENGTHS},
    grid::{CellState, Grid},
};

/// Per-cell placement counts, indexed `[x][y]`.
pub type ProbabilityMap = [[u32; GRID_SIZE]; GRID_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// No live hit: shoot anywhere not yet shot.
    Hunt,
    /// At least one hit on a ship that is still afloat.
    Target,
}

/// Hit cells whose ship has not been sunk yet, in row-major order.
pub fn live_hits(grid: &Grid) -> Vec<Coord> {
    let mut hits = Vec::new();
    for x in 0..GRID_SIZE {
        for y in 0..GRID_SIZE {
            let coord = Coord::new(x, y);
            let Some(cell) = grid.cell(coord) else { continue };
            if cell.state != CellState::Hit {
                continue;
            }
            let sunk = cell
                .ship_id
                .and_then(|id| grid.ship(id))
                .is_some_and(|s| s.is_sunk());
            if !sunk {
                hits.push(coord);
            }
        }
    }
    hits
}

pub fn mode(grid: &Grid) -> TargetMode {
    if live_hits(grid).is_empty() {
        TargetMode::Hunt
    } else {
        TargetMode::Target
    }
}

/// Count, for every cell, the straight placements of each candidate length
/// that pass through one of `hits` and cross no miss.
pub fn probability_map(grid: &Grid, hits: &[Coord]) -> ProbabilityMap {
    let mut map = [[0u32; GRID_SIZE]; GRID_SIZE];
    let is_miss = |c: Coord| grid.state_at(c) == Some(CellState::Miss);

    for &hit in hits {
        for len in TARGET_LENGTHS {
            for orient in [Orientation::Horizontal, Orientation::Vertical] {
                let along = match orient {
                    Orientation::Horizontal => hit.y,
                    Orientation::Vertical => hit.x,
                };
                // every start that keeps the hit inside the ship
                let first = (along + 1).saturating_sub(len);
                for start in first..=along {
                    if start + len > GRID_SIZE {
                        break;
                    }
                    let cells = (start..start + len).map(|i| match orient {
                        Orientation::Horizontal => Coord::new(hit.x, i),
                        Orientation::Vertical => Coord::new(i, hit.y),
                    });
                    if cells.clone().any(is_miss) {
                        continue;
                    }
                    for c in cells {
                        map[c.x][c.y] += 1;
                    }
                }
            }
        }
    }
    map
}

/// Highest-scoring cell that has not been shot. Ties go to the first cell in
/// row-major order; `None` if no unshot cell scores above zero.
pub fn best_target(map: &ProbabilityMap, grid: &Grid) -> Option<Coord> {
    let mut best: Option<(Coord, u32)> = None;
    for c in grid.unshot() {
        let score = map[c.x][c.y];
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((c, score));
        }
    }
    best.map(|(c, _)| c)
}

/// Uniformly random unshot cell.
pub fn hunt<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Coord> {
    let open: Vec<Coord> = grid.unshot().collect();
    if open.is_empty() {
        return None;
    }
    Some(open[rng.random_range(0..open.len())])
}

/// Pick the next shot against `grid`. Never returns a cell already shot;
/// `None` only when every cell has been shot.
pub fn next_shot<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Coord> {
    let hits = live_hits(grid);
    if !hits.is_empty() {
        let map = probability_map(grid, &hits);
        if let Some(target) = best_target(&map, grid) {
            return Some(target);
        }
    }
    hunt(grid, rng)
}
