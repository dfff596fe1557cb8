use rand::rngs::SmallRng;

use crate::{
    ai,
    common::Coord,
    config::EngineConfig,
    grid::Grid,
    placement::{self, PlacementError},
};

/// Interface implemented by automated opponents.
///
/// A player is responsible for:
/// - laying out its own fleet
/// - choosing the next shot against the opponent's grid
pub trait Player: Send + Sync {
    /// Build a fully populated grid for this player.
    fn place_fleet(&self, rng: &mut SmallRng, config: &EngineConfig) -> Result<Grid, PlacementError>;

    /// Choose the next target on `opponent`. Must not return a cell that was
    /// already shot; `None` means nothing is left to shoot.
    fn select_target(&self, rng: &mut SmallRng, opponent: &Grid) -> Option<Coord>;
}

/// Scripted opponent: random fleet, probability-map targeting.
#[derive(Debug, Default, Clone, Copy)]
pub struct AiPlayer;

impl AiPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Player for AiPlayer {
    fn place_fleet(&self, rng: &mut SmallRng, config: &EngineConfig) -> Result<Grid, PlacementError> {
        placement::auto_place(
            rng,
            &config.fleet,
            config.no_touching,
            config.max_placement_attempts,
        )
    }

    fn select_target(&self, rng: &mut SmallRng, opponent: &Grid) -> Option<Coord> {
        ai::next_shot(opponent, rng)
    }
}
