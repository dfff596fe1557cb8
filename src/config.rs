use alloc::vec::Vec;

pub const GRID_SIZE: usize = 10;

/// Ship lengths of the standard fleet, in placement order. Auto-placement
/// assigns ids `1..=FLEET.len()` following this order.
pub const FLEET: [usize; 9] = [4, 3, 3, 2, 2, 1, 1, 1, 1];

/// Total number of ship segments in the standard fleet.
pub const FLEET_CELLS: usize = 4 + 3 + 3 + 2 + 2 + 1 + 1 + 1 + 1;

/// Ship lengths the targeting heuristic considers around a live hit.
pub const TARGET_LENGTHS: [usize; 4] = [2, 3, 4, 5];

/// Random positions tried per ship before auto-placement gives up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 2000;

/// Rating change for winning (or losing) by sinking the whole fleet.
pub const SINK_WIN_DELTA: i32 = 10;

/// Rating change for a match decided by surrender.
pub const SURRENDER_DELTA: i32 = 5;

/// Runtime knobs for placement and the scripted opponent.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub fleet: Vec<usize>,
    /// Reject auto-placed ships whose 1-cell border touches another ship.
    pub no_touching: bool,
    pub max_placement_attempts: usize,
    /// Fix the RNG for reproducible matches.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fleet: FLEET.to_vec(),
            no_touching: true,
            max_placement_attempts: MAX_PLACEMENT_ATTEMPTS,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Config with a fixed seed, everything else default.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
