#![cfg(feature = "std")]

//! Async front door to the engine. Every state change runs load → mutate →
//! save under a per-match lock, then pushes notifications and ratings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    config::EngineConfig,
    game::{Game, Match, MatchError, MatchId, MatchResult, MatchStatus, Mode, PlayerId, ShotRecord, Side},
    grid::{BoardView, Grid},
    ledger::RatingLedger,
    notify::{Event, Notifier, Recipient},
    placement::{self, PlacementSpec},
    player::{AiPlayer, Player},
    store::MatchStore,
};

/// Everything a caller learns from one attack.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttackReport {
    pub hit: bool,
    pub sunk: bool,
    pub already_shot: bool,
    pub match_finished: bool,
    pub winner: Option<MatchResult>,
    /// Side to move after this call, opponent shots included.
    pub current_turn: Side,
    /// Shots the scripted opponent fired in reply, in order.
    pub opponent_moves: Vec<ShotRecord>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

type LockMap = Mutex<HashMap<MatchId, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive hold on one match. Dropping it releases the lock and evicts
/// the map entry once no other caller is waiting on it.
struct MatchLock<'a> {
    locks: &'a LockMap,
    id: MatchId,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for MatchLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(self.guard.take());
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

fn storage(err: anyhow::Error) -> MatchError {
    MatchError::Storage(format!("{:#}", err))
}

pub struct MatchService {
    store: Box<dyn MatchStore>,
    notifier: Box<dyn Notifier>,
    ledger: Box<dyn RatingLedger>,
    opponent: Arc<dyn Player>,
    config: EngineConfig,
    rng: Mutex<SmallRng>,
    locks: LockMap,
    next_id: AtomicU64,
}

impl MatchService {
    pub fn new(
        store: impl MatchStore + 'static,
        notifier: impl Notifier + 'static,
        ledger: impl RatingLedger + 'static,
        config: EngineConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            store: Box::new(store),
            notifier: Box::new(notifier),
            ledger: Box::new(ledger),
            opponent: Arc::new(AiPlayer::new()),
            config,
            rng: Mutex::new(rng),
            locks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the scripted opponent.
    pub fn with_opponent(mut self, opponent: Arc<dyn Player>) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Independent generator for one operation, split off the service seed.
    fn fork_rng(&self) -> SmallRng {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        SmallRng::from_rng(&mut *rng)
    }

    fn lock_for(&self, id: MatchId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    async fn acquire(&self, id: MatchId) -> MatchLock<'_> {
        let lock = self.lock_for(id);
        let mut held = MatchLock {
            locks: &self.locks,
            id,
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Matches with a caller currently holding or waiting on their lock.
    pub fn active_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn load(&self, id: MatchId) -> Result<Game, MatchError> {
        let record = self
            .store
            .load_match(id)
            .await
            .map_err(storage)?
            .ok_or(MatchError::NotFound(id))?;
        let host = self.store.load_grid(id, Side::Host).await.map_err(storage)?;
        let guest = self.store.load_grid(id, Side::Guest).await.map_err(storage)?;
        Ok(Game::from_parts(
            record,
            host.unwrap_or_default(),
            guest.unwrap_or_default(),
        ))
    }

    /// Commit the record and both grids in one store write.
    async fn save(&self, game: &Game) -> Result<(), MatchError> {
        self.store
            .commit(game.record(), game.grid(Side::Host), game.grid(Side::Guest))
            .await
            .map_err(storage)
    }

    async fn emit(&self, id: MatchId, to: Recipient, event: Event) {
        if let Err(err) = self.notifier.notify(id, to, event).await {
            log::warn!("match {}: notification dropped: {:#}", id, err);
        }
    }

    /// Perspective boards for every human participant.
    async fn emit_boards(&self, game: &Game) {
        let record = game.record();
        for side in [Side::Host, Side::Guest] {
            let Some(player) = record.participant(side) else {
                continue;
            };
            let event = Event::BoardUpdate {
                own: game.grid(side).render(true),
                opponent: game.grid(side.opponent()).render(false),
                turn: record.turn(),
                status: record.status(),
            };
            self.emit(record.id(), Recipient::Player(player), event).await;
        }
    }

    async fn conclude(&self, record: &Match) {
        if let Some(result) = record.result() {
            self.emit(record.id(), Recipient::Broadcast, Event::MatchFinished { result })
                .await;
        }
        for change in record.rating_changes() {
            if let Err(err) = self.ledger.record(record.id(), change).await {
                log::warn!(
                    "match {}: rating update for {} failed: {:#}",
                    record.id(),
                    change.player,
                    err
                );
            }
        }
    }

    fn place_opponent(&self, game: &mut Game, rng: &mut SmallRng, now: u64) -> Result<(), MatchError> {
        let grid = self.opponent.place_fleet(rng, &self.config)?;
        game.populate(Side::Guest, grid, now)?;
        Ok(())
    }

    /// Open a new match. Against the scripted opponent its fleet is placed
    /// right away.
    pub async fn create_match(&self, mode: Mode, host: PlayerId) -> Result<Match, MatchError> {
        let id = MatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = now_millis();
        let mut game = Game::create(id, mode, host, now);
        if game.record().is_automated() {
            let mut rng = self.fork_rng();
            self.place_opponent(&mut game, &mut rng, now)?;
        }
        self.save(&game).await?;
        log::info!("match {} created by {} ({:?})", id, host, mode);
        Ok(game.record().clone())
    }

    pub async fn join(&self, id: MatchId, guest: PlayerId) -> Result<Match, MatchError> {
        let _lock = self.acquire(id).await;
        let mut game = self.load(id).await?;
        game.join(guest)?;
        self.save(&game).await?;
        self.emit(id, Recipient::Broadcast, Event::PlayerJoined { player: guest })
            .await;
        Ok(game.record().clone())
    }

    /// Fill `side`'s grid from a submitted layout or at random. Returns the
    /// owner's view of the new grid.
    pub async fn populate_side(
        &self,
        id: MatchId,
        side: Side,
        spec: PlacementSpec,
    ) -> Result<BoardView, MatchError> {
        let _lock = self.acquire(id).await;
        let mut game = self.load(id).await?;
        if game.record().is_automated() && side == Side::Guest {
            return Err(MatchError::Rejected("the guest side is played by the computer"));
        }
        if !game.record().has_side(side) {
            return Err(MatchError::SideNotFound { id, side });
        }
        let grid: Grid = match spec {
            PlacementSpec::Auto => {
                let mut rng = self.fork_rng();
                placement::auto_place(
                    &mut rng,
                    &self.config.fleet,
                    self.config.no_touching,
                    self.config.max_placement_attempts,
                )?
            }
            PlacementSpec::Manual(manual) => placement::validate_manual(&manual, &self.config.fleet)?,
        };
        let started = game.populate(side, grid, now_millis())?;
        self.save(&game).await?;
        if started {
            self.emit(id, Recipient::Broadcast, Event::MatchStarted { turn: game.record().turn() })
                .await;
            self.emit_boards(&game).await;
        }
        Ok(game.grid(side).render(true))
    }

    pub async fn mark_ready(&self, id: MatchId, side: Side) -> Result<Match, MatchError> {
        let _lock = self.acquire(id).await;
        let mut game = self.load(id).await?;
        let started = game.mark_ready(side, now_millis())?;
        self.save(&game).await?;
        self.emit(id, Recipient::Broadcast, Event::PlayerReady { side })
            .await;
        if started {
            self.emit(id, Recipient::Broadcast, Event::MatchStarted { turn: game.record().turn() })
                .await;
            self.emit_boards(&game).await;
        }
        Ok(game.record().clone())
    }

    /// Fire at the opponent of `side`. Against the scripted opponent a miss
    /// hands it the turn and its reply is played before this returns.
    pub async fn attack(&self, id: MatchId, side: Side, x: usize, y: usize) -> Result<AttackReport, MatchError> {
        let _lock = self.acquire(id).await;
        let mut game = self.load(id).await?;
        if game.record().is_automated() && side == Side::Guest {
            return Err(MatchError::Rejected("the guest side is played by the computer"));
        }

        let now = now_millis();
        let before = game.record().moves().len();
        let turn_before = game.record().turn();
        let outcome = game.fire(side, x, y, now)?;
        if outcome.already_shot {
            return Ok(AttackReport {
                hit: false,
                sunk: false,
                already_shot: true,
                match_finished: false,
                winner: None,
                current_turn: game.record().turn(),
                opponent_moves: Vec::new(),
            });
        }

        let opponent_moves = if game.record().is_automated() {
            let mut rng = self.fork_rng();
            game.play_bot_turns(self.opponent.as_ref(), &mut rng, now)
        } else {
            Vec::new()
        };
        self.save(&game).await?;

        let record = game.record();
        for shot in &record.moves()[before..] {
            self.emit(id, Recipient::Broadcast, Event::ShotFired(*shot)).await;
        }
        let finished = record.status() == MatchStatus::Finished;
        if finished {
            self.conclude(record).await;
        } else if record.turn() != turn_before {
            self.emit(id, Recipient::Broadcast, Event::TurnChanged { turn: record.turn() })
                .await;
        }
        self.emit_boards(&game).await;

        Ok(AttackReport {
            hit: outcome.hit,
            sunk: outcome.sunk,
            already_shot: false,
            match_finished: finished,
            winner: record.result(),
            current_turn: record.turn(),
            opponent_moves,
        })
    }

    pub async fn surrender(&self, id: MatchId, side: Side) -> Result<Match, MatchError> {
        let _lock = self.acquire(id).await;
        let mut game = self.load(id).await?;
        game.surrender(side, now_millis())?;
        self.save(&game).await?;
        self.conclude(game.record()).await;
        self.emit_boards(&game).await;
        Ok(game.record().clone())
    }

    /// New match for the same participants with `requester` hosting. The old
    /// match is left untouched.
    pub async fn rematch(&self, id: MatchId, requester: PlayerId) -> Result<Match, MatchError> {
        let _lock = self.acquire(id).await;
        let previous = self
            .store
            .load_match(id)
            .await
            .map_err(storage)?
            .ok_or(MatchError::NotFound(id))?;
        let next_id = MatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let now = now_millis();
        let record = previous.rematch(next_id, requester, now)?;
        let mut game = Game::from_parts(record, Grid::new(), Grid::new());
        if game.record().is_automated() {
            let mut rng = self.fork_rng();
            self.place_opponent(&mut game, &mut rng, now)?;
        }
        self.save(&game).await?;
        log::info!("match {} is a rematch of {}", next_id, id);
        Ok(game.record().clone())
    }

    /// Render `side`'s grid. Ship cells are shown only with `reveal_own_ships`.
    pub async fn view_grid(&self, id: MatchId, side: Side, reveal_own_ships: bool) -> Result<BoardView, MatchError> {
        let _lock = self.acquire(id).await;
        let game = self.load(id).await?;
        if !game.record().has_side(side) {
            return Err(MatchError::SideNotFound { id, side });
        }
        Ok(game.grid(side).render(reveal_own_ships))
    }

    pub async fn get_match(&self, id: MatchId) -> Result<Match, MatchError> {
        self.store
            .load_match(id)
            .await
            .map_err(storage)?
            .ok_or(MatchError::NotFound(id))
    }
}
