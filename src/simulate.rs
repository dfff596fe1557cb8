//! Headless matches where both sides are automated.

use rand::rngs::SmallRng;

use crate::{
    ai,
    config::EngineConfig,
    game::{Game, MatchError, MatchId, MatchResult, MatchStatus, Mode, PlayerId, Side},
    player::Player,
};

/// Outcome of one simulated match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationSummary {
    pub result: MatchResult,
    pub host_shots: usize,
    pub guest_shots: usize,
}

/// Play a full match with `host` driving the host side and `guest` the
/// scripted side. Returns the summary and the finished game.
pub fn simulate(
    config: &EngineConfig,
    host: &dyn Player,
    guest: &dyn Player,
    rng: &mut SmallRng,
) -> Result<(SimulationSummary, Game), MatchError> {
    let mut game = Game::create(MatchId(0), Mode::AutomatedOpponent, PlayerId(0), 0);
    let guest_grid = guest.place_fleet(rng, config)?;
    game.populate(Side::Guest, guest_grid, 0)?;
    let host_grid = host.place_fleet(rng, config)?;
    game.populate(Side::Host, host_grid, 0)?;

    let mut tick = 0u64;
    while game.record().status() == MatchStatus::InProgress {
        tick += 1;
        match game.record().turn() {
            Side::Host => {
                let target = game.grid(Side::Guest);
                let coord = host
                    .select_target(rng, target)
                    .filter(|c| target.state_at(*c).is_some_and(|s| !s.is_shot()))
                    .or_else(|| ai::hunt(target, rng))
                    .ok_or(MatchError::Rejected("no cell left to shoot"))?;
                game.fire(Side::Host, coord.x, coord.y, tick)?;
            }
            Side::Guest => {
                if game.play_bot_turns(guest, rng, tick).is_empty() {
                    return Err(MatchError::Rejected("opponent could not move"));
                }
            }
        }
    }

    let moves = game.record().moves();
    let host_shots = moves.iter().filter(|m| m.side == Side::Host).count();
    let summary = SimulationSummary {
        result: game
            .record()
            .result()
            .ok_or(MatchError::Rejected("match ended without a result"))?,
        host_shots,
        guest_shots: moves.len() - host_shots,
    };
    Ok((summary, game))
}
