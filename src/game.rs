//! Match lifecycle: who plays, whose turn it is, and how shots move the match
//! from waiting to finished.

use alloc::{string::String, vec, vec::Vec};
use core::fmt;

use rand::rngs::SmallRng;

use crate::{
    ai,
    common::{Coord, GridError, ShotOutcome},
    config::{SINK_WIN_DELTA, SURRENDER_DELTA},
    grid::Grid,
    placement::PlacementError,
    player::Player,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Host plays the scripted opponent, which occupies the guest side.
    AutomatedOpponent,
    HumanOpponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchStatus {
    Waiting,
    InProgress,
    Finished,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Waiting => "WAITING",
            MatchStatus::InProgress => "IN_PROGRESS",
            MatchStatus::Finished => "FINISHED",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchResult {
    HostWin,
    GuestWin,
    /// The host gave up against the scripted opponent.
    Surrender,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Host,
    Guest,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Host => Side::Guest,
            Side::Guest => Side::Host,
        }
    }

    /// Result recorded when this side wins.
    pub fn win(self) -> MatchResult {
        match self {
            Side::Host => MatchResult::HostWin,
            Side::Guest => MatchResult::GuestWin,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Host => "HOST",
            Side::Guest => "GUEST",
        })
    }
}

/// One applied shot, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShotRecord {
    pub side: Side,
    pub coord: Coord,
    pub hit: bool,
    pub sunk: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultKind {
    Win,
    Loss,
}

/// A rating adjustment owed to one participant when a match concludes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingChange {
    pub player: PlayerId,
    /// The other human, if any. `None` against the scripted opponent.
    pub opponent: Option<PlayerId>,
    pub delta: i32,
    pub kind: ResultKind,
}

/// Why an action was refused because of turn order or match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NotInProgress(MatchStatus),
    OutOfTurn { side: Side, turn: Side },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotInProgress(status) => write!(f, "match is {}", status),
            Violation::OutOfTurn { side, turn } => {
                write!(f, "{} moved but it is {}'s turn", side, turn)
            }
        }
    }
}

/// Errors returned by match operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("match {0} not found")]
    NotFound(MatchId),
    #[error("match {id} has no {side} participant")]
    SideNotFound { id: MatchId, side: Side },
    #[error("turn violation: {0}")]
    TurnViolation(Violation),
    #[error("coordinate ({x}, {y}) is off the board")]
    InvalidCoordinate { x: usize, y: usize },
    #[error("invalid placement: {0}")]
    InvalidPlacement(PlacementError),
    #[error("could not fit a ship of length {length} after {attempts} attempts")]
    IllegalFleetState { length: usize, attempts: usize },
    #[error("action rejected: {0}")]
    Rejected(&'static str),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<PlacementError> for MatchError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::IllegalFleetState { length, attempts } => {
                MatchError::IllegalFleetState { length, attempts }
            }
            other => MatchError::InvalidPlacement(other),
        }
    }
}

/// Persistent record of one match. Grids are stored separately, keyed by
/// (match id, side).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Match {
    id: MatchId,
    mode: Mode,
    status: MatchStatus,
    result: Option<MatchResult>,
    turn: Side,
    host: PlayerId,
    guest: Option<PlayerId>,
    host_ready: bool,
    guest_ready: bool,
    surrendered_by: Option<Side>,
    created_at: u64,
    started_at: Option<u64>,
    finished_at: Option<u64>,
    moves: Vec<ShotRecord>,
}

impl Match {
    /// New match in `Waiting`, host to move once it starts.
    pub fn new(id: MatchId, mode: Mode, host: PlayerId, now: u64) -> Self {
        Self {
            id,
            mode,
            status: MatchStatus::Waiting,
            result: None,
            turn: Side::Host,
            host,
            guest: None,
            host_ready: false,
            guest_ready: false,
            surrendered_by: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            moves: Vec::new(),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    /// Side to move. Only meaningful while the match is in progress.
    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn guest(&self) -> Option<PlayerId> {
        self.guest
    }

    pub fn is_automated(&self) -> bool {
        self.mode == Mode::AutomatedOpponent
    }

    /// `false` only for the guest side of a human match nobody has joined.
    pub fn has_side(&self, side: Side) -> bool {
        side == Side::Host || self.is_automated() || self.guest.is_some()
    }

    pub fn is_ready(&self, side: Side) -> bool {
        match side {
            Side::Host => self.host_ready,
            Side::Guest => self.guest_ready,
        }
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<u64> {
        self.finished_at
    }

    pub fn surrendered_by(&self) -> Option<Side> {
        self.surrendered_by
    }

    pub fn moves(&self) -> &[ShotRecord] {
        &self.moves
    }

    /// Human participant on `side`, if any. The scripted opponent has none.
    pub fn participant(&self, side: Side) -> Option<PlayerId> {
        match side {
            Side::Host => Some(self.host),
            Side::Guest => self.guest,
        }
    }

    /// Resolve a player to the side they occupy in this match.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if player == self.host {
            Some(Side::Host)
        } else if self.guest == Some(player) {
            Some(Side::Guest)
        } else {
            None
        }
    }

    /// Fresh match for the same participants, hosted by `requester`.
    pub fn rematch(&self, id: MatchId, requester: PlayerId, now: u64) -> Result<Match, MatchError> {
        let side = self
            .side_of(requester)
            .ok_or(MatchError::Rejected("only a participant can ask for a rematch"))?;
        let mut next = Match::new(id, self.mode, requester, now);
        next.guest = self.participant(side.opponent());
        Ok(next)
    }

    /// Rating adjustments owed once the match is finished; empty before that.
    pub fn rating_changes(&self) -> Vec<RatingChange> {
        let Some(result) = self.result else {
            return Vec::new();
        };
        let delta = if self.surrendered_by.is_some() {
            SURRENDER_DELTA
        } else {
            SINK_WIN_DELTA
        };
        let winner = match result {
            MatchResult::HostWin => Side::Host,
            MatchResult::GuestWin => Side::Guest,
            MatchResult::Surrender => Side::Guest,
        };
        let change = |side: Side| {
            self.participant(side).map(|player| RatingChange {
                player,
                opponent: self.participant(side.opponent()),
                delta: if side == winner { delta } else { -delta },
                kind: if side == winner {
                    ResultKind::Win
                } else {
                    ResultKind::Loss
                },
            })
        };
        vec![change(Side::Host), change(Side::Guest)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn start(&mut self, now: u64) {
        self.status = MatchStatus::InProgress;
        self.turn = Side::Host;
        self.started_at = Some(now);
        log::info!("match {} started", self.id);
    }

    fn finish(&mut self, result: MatchResult, now: u64) {
        self.status = MatchStatus::Finished;
        self.result = Some(result);
        self.finished_at = Some(now);
        log::info!("match {} finished: {:?}", self.id, result);
    }

    fn ensure_in_progress(&self) -> Result<(), MatchError> {
        if self.status != MatchStatus::InProgress {
            return Err(MatchError::TurnViolation(Violation::NotInProgress(
                self.status,
            )));
        }
        Ok(())
    }
}

/// A match together with both grids: the unit every state change works on.
#[derive(Clone, Debug)]
pub struct Game {
    record: Match,
    host_grid: Grid,
    guest_grid: Grid,
}

impl Game {
    /// New match with two empty grids.
    pub fn create(id: MatchId, mode: Mode, host: PlayerId, now: u64) -> Self {
        Self::from_parts(Match::new(id, mode, host, now), Grid::new(), Grid::new())
    }

    pub fn from_parts(record: Match, host_grid: Grid, guest_grid: Grid) -> Self {
        Self {
            record,
            host_grid,
            guest_grid,
        }
    }

    pub fn record(&self) -> &Match {
        &self.record
    }

    pub fn grid(&self, side: Side) -> &Grid {
        match side {
            Side::Host => &self.host_grid,
            Side::Guest => &self.guest_grid,
        }
    }

    fn grid_mut(&mut self, side: Side) -> &mut Grid {
        match side {
            Side::Host => &mut self.host_grid,
            Side::Guest => &mut self.guest_grid,
        }
    }

    fn ensure_side(&self, side: Side) -> Result<(), MatchError> {
        if !self.record.has_side(side) {
            return Err(MatchError::SideNotFound {
                id: self.record.id,
                side,
            });
        }
        Ok(())
    }

    /// Seat a second human player.
    pub fn join(&mut self, guest: PlayerId) -> Result<(), MatchError> {
        let record = &mut self.record;
        if record.is_automated() {
            return Err(MatchError::Rejected("the guest side is played by the computer"));
        }
        if record.status != MatchStatus::Waiting {
            return Err(MatchError::Rejected("match has already started"));
        }
        if guest == record.host {
            return Err(MatchError::Rejected("host cannot join their own match"));
        }
        match record.guest {
            Some(existing) if existing == guest => Ok(()),
            Some(_) => Err(MatchError::Rejected("match is full")),
            None => {
                record.guest = Some(guest);
                log::info!("{} joined match {}", guest, record.id);
                Ok(())
            }
        }
    }

    /// Replace `side`'s grid with a freshly placed fleet. Returns `true` if
    /// this started the match.
    pub fn populate(&mut self, side: Side, grid: Grid, now: u64) -> Result<bool, MatchError> {
        self.ensure_side(side)?;
        if self.record.status != MatchStatus::Waiting {
            return Err(MatchError::Rejected(
                "fleets can only be placed before the match starts",
            ));
        }
        if !grid.is_populated() || grid.unshot().count() != crate::config::GRID_SIZE.pow(2) {
            return Err(MatchError::Rejected("placement must be a fresh, populated grid"));
        }
        *self.grid_mut(side) = grid;
        match side {
            Side::Host => self.record.host_ready = false,
            Side::Guest => self.record.guest_ready = false,
        }
        let both = self.host_grid.is_populated() && self.guest_grid.is_populated();
        if self.record.is_automated() && both {
            self.record.start(now);
            return Ok(true);
        }
        Ok(false)
    }

    /// Human-vs-human readiness. Returns `true` if this started the match.
    pub fn mark_ready(&mut self, side: Side, now: u64) -> Result<bool, MatchError> {
        if self.record.is_automated() {
            return Err(MatchError::Rejected(
                "readiness is only signalled between human players",
            ));
        }
        self.ensure_side(side)?;
        if self.record.status != MatchStatus::Waiting {
            return Err(MatchError::Rejected("match has already started"));
        }
        if !self.grid(side).is_populated() {
            return Err(MatchError::Rejected("place the fleet before signalling ready"));
        }
        match side {
            Side::Host => self.record.host_ready = true,
            Side::Guest => self.record.guest_ready = true,
        }
        if self.record.host_ready && self.record.guest_ready {
            self.record.start(now);
            return Ok(true);
        }
        Ok(false)
    }

    /// Resolve one shot by `side` against the opposing grid.
    ///
    /// A hit (sinking or not) keeps the turn, a miss passes it, a shot that
    /// empties the opposing fleet finishes the match. Re-shooting a cell
    /// changes nothing and keeps the turn.
    pub fn fire(&mut self, side: Side, x: usize, y: usize, now: u64) -> Result<ShotOutcome, MatchError> {
        self.record.ensure_in_progress()?;
        if side != self.record.turn {
            return Err(MatchError::TurnViolation(Violation::OutOfTurn {
                side,
                turn: self.record.turn,
            }));
        }
        let coord = Coord::new(x, y);
        if !coord.in_bounds() {
            return Err(MatchError::InvalidCoordinate { x, y });
        }

        let target = self.grid_mut(side.opponent());
        let outcome = target.shoot(x, y)?;
        if outcome.already_shot {
            return Ok(outcome);
        }
        let fleet_gone = target.all_sunk();

        log::debug!(
            "match {}: {} fires at {} -> hit={} sunk={}",
            self.record.id,
            side,
            coord,
            outcome.hit,
            outcome.sunk
        );
        self.record.moves.push(ShotRecord {
            side,
            coord,
            hit: outcome.hit,
            sunk: outcome.sunk,
        });

        if fleet_gone {
            self.record.finish(side.win(), now);
        } else if !outcome.hit {
            self.record.turn = side.opponent();
        }
        Ok(outcome)
    }

    /// Let the scripted opponent shoot for as long as it holds the turn.
    pub fn play_bot_turns(&mut self, player: &dyn Player, rng: &mut SmallRng, now: u64) -> Vec<ShotRecord> {
        let mut shots = Vec::new();
        while self.record.is_automated()
            && self.record.status == MatchStatus::InProgress
            && self.record.turn == Side::Guest
        {
            let target = player
                .select_target(rng, &self.host_grid)
                .filter(|c| self.host_grid.state_at(*c).is_some_and(|s| !s.is_shot()))
                .or_else(|| ai::hunt(&self.host_grid, rng));
            let Some(coord) = target else {
                log::warn!("match {}: no cell left for the opponent to shoot", self.record.id);
                break;
            };
            match self.fire(Side::Guest, coord.x, coord.y, now) {
                Ok(outcome) => shots.push(ShotRecord {
                    side: Side::Guest,
                    coord,
                    hit: outcome.hit,
                    sunk: outcome.sunk,
                }),
                Err(err) => {
                    log::warn!("match {}: opponent shot rejected: {}", self.record.id, err);
                    break;
                }
            }
        }
        shots
    }

    /// Concede. Only possible while the match is in progress.
    pub fn surrender(&mut self, side: Side, now: u64) -> Result<MatchResult, MatchError> {
        self.record.ensure_in_progress()?;
        let result = if self.record.is_automated() {
            if side != Side::Host {
                return Err(MatchError::SideNotFound {
                    id: self.record.id,
                    side,
                });
            }
            MatchResult::Surrender
        } else {
            side.opponent().win()
        };
        self.record.surrendered_by = Some(side);
        self.record.finish(result, now);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;
    use rand::SeedableRng;

    const HOST: PlayerId = PlayerId(1);
    const GUEST: PlayerId = PlayerId(2);

    fn small_fleet() -> Grid {
        let mut grid = Grid::new();
        grid.place(1, 0, 0, Orientation::Horizontal, 2).unwrap();
        grid.place(2, 5, 5, Orientation::Vertical, 1).unwrap();
        grid
    }

    fn online_game() -> Game {
        let mut game = Game::create(MatchId(7), Mode::HumanOpponent, HOST, 0);
        game.join(GUEST).unwrap();
        game.populate(Side::Host, small_fleet(), 1).unwrap();
        game.populate(Side::Guest, small_fleet(), 1).unwrap();
        game.mark_ready(Side::Host, 2).unwrap();
        assert!(game.mark_ready(Side::Guest, 3).unwrap());
        game
    }

    #[test]
    fn ready_flags_start_online_match() {
        let game = online_game();
        let record = game.record();
        assert_eq!(record.status(), MatchStatus::InProgress);
        assert_eq!(record.turn(), Side::Host);
        assert_eq!(record.started_at(), Some(3));
    }

    #[test]
    fn ready_requires_a_fleet() {
        let mut game = Game::create(MatchId(1), Mode::HumanOpponent, HOST, 0);
        game.join(GUEST).unwrap();
        assert!(matches!(
            game.mark_ready(Side::Guest, 1),
            Err(MatchError::Rejected(_))
        ));
    }

    #[test]
    fn guest_side_missing_until_join() {
        let mut game = Game::create(MatchId(1), Mode::HumanOpponent, HOST, 0);
        assert_eq!(
            game.populate(Side::Guest, small_fleet(), 1),
            Err(MatchError::SideNotFound {
                id: MatchId(1),
                side: Side::Guest
            })
        );
        assert!(game.join(HOST).is_err());
        game.join(GUEST).unwrap();
        assert_eq!(
            game.join(PlayerId(3)),
            Err(MatchError::Rejected("match is full"))
        );
    }

    #[test]
    fn hit_keeps_turn_miss_passes_it() {
        let mut game = online_game();
        let hit = game.fire(Side::Host, 0, 0, 4).unwrap();
        assert!(hit.hit && !hit.sunk);
        assert_eq!(game.record().turn(), Side::Host);

        let sink = game.fire(Side::Host, 0, 1, 5).unwrap();
        assert!(sink.sunk);
        assert_eq!(game.record().turn(), Side::Host);

        let miss = game.fire(Side::Host, 9, 9, 6).unwrap();
        assert!(!miss.hit);
        assert_eq!(game.record().turn(), Side::Guest);

        assert_eq!(
            game.fire(Side::Host, 9, 8, 7),
            Err(MatchError::TurnViolation(Violation::OutOfTurn {
                side: Side::Host,
                turn: Side::Guest
            }))
        );
    }

    #[test]
    fn already_shot_keeps_turn_and_logs_nothing() {
        let mut game = online_game();
        game.fire(Side::Host, 0, 0, 4).unwrap();
        let again = game.fire(Side::Host, 0, 0, 5).unwrap();
        assert!(again.already_shot);
        assert_eq!(game.record().turn(), Side::Host);
        assert_eq!(game.record().moves().len(), 1);
    }

    #[test]
    fn sinking_last_ship_finishes() {
        let mut game = online_game();
        game.fire(Side::Host, 0, 0, 4).unwrap();
        game.fire(Side::Host, 0, 1, 5).unwrap();
        assert_eq!(game.record().status(), MatchStatus::InProgress);
        game.fire(Side::Host, 5, 5, 6).unwrap();
        let record = game.record();
        assert_eq!(record.status(), MatchStatus::Finished);
        assert_eq!(record.result(), Some(MatchResult::HostWin));
        assert_eq!(record.finished_at(), Some(6));
        assert_eq!(
            record.rating_changes(),
            vec![
                RatingChange {
                    player: HOST,
                    opponent: Some(GUEST),
                    delta: 10,
                    kind: ResultKind::Win
                },
                RatingChange {
                    player: GUEST,
                    opponent: Some(HOST),
                    delta: -10,
                    kind: ResultKind::Loss
                },
            ]
        );
        assert!(matches!(
            game.fire(Side::Host, 9, 9, 7),
            Err(MatchError::TurnViolation(Violation::NotInProgress(
                MatchStatus::Finished
            )))
        ));
    }

    #[test]
    fn surrender_awards_the_other_side() {
        let mut game = online_game();
        assert_eq!(
            game.surrender(Side::Guest, 9).unwrap(),
            MatchResult::HostWin
        );
        let changes = game.record().rating_changes();
        assert_eq!(changes[0].delta, 5);
        assert_eq!(changes[1].delta, -5);
    }

    #[test]
    fn bot_surrender_is_marked_distinctly() {
        let mut game = Game::create(MatchId(3), Mode::AutomatedOpponent, HOST, 0);
        game.populate(Side::Guest, small_fleet(), 0).unwrap();
        assert!(game.populate(Side::Host, small_fleet(), 1).unwrap());
        assert_eq!(game.surrender(Side::Host, 2).unwrap(), MatchResult::Surrender);
        assert_eq!(
            game.record().rating_changes(),
            vec![RatingChange {
                player: HOST,
                opponent: None,
                delta: -5,
                kind: ResultKind::Loss
            }]
        );
    }

    #[test]
    fn bot_shoots_until_it_misses() {
        let mut game = Game::create(MatchId(4), Mode::AutomatedOpponent, HOST, 0);
        game.populate(Side::Guest, small_fleet(), 0).unwrap();
        game.populate(Side::Host, small_fleet(), 0).unwrap();
        game.fire(Side::Host, 9, 9, 1).unwrap();
        assert_eq!(game.record().turn(), Side::Guest);

        let mut rng = SmallRng::seed_from_u64(11);
        let shots = game.play_bot_turns(&crate::player::AiPlayer, &mut rng, 2);
        assert!(!shots.is_empty());
        let (last, rest) = shots.split_last().unwrap();
        assert!(rest.iter().all(|s| s.hit));
        if game.record().status() == MatchStatus::InProgress {
            assert!(!last.hit);
            assert_eq!(game.record().turn(), Side::Host);
        }
    }

    #[test]
    fn rematch_swaps_in_requester_as_host() {
        let game = online_game();
        let next = game.record().rematch(MatchId(8), GUEST, 10).unwrap();
        assert_eq!(next.host(), GUEST);
        assert_eq!(next.guest(), Some(HOST));
        assert_eq!(next.status(), MatchStatus::Waiting);
        assert!(game.record().rematch(MatchId(9), PlayerId(99), 10).is_err());
    }
}
