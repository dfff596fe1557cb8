#![cfg(feature = "std")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::game::{MatchId, PlayerId, RatingChange, ResultKind};

/// Rating a player has before their first recorded result.
pub const STARTING_RATING: u32 = 1000;

/// Sink for per-player results, called once per participant when a match
/// concludes.
#[async_trait::async_trait]
pub trait RatingLedger: Send + Sync {
    async fn record(&self, id: MatchId, change: RatingChange) -> anyhow::Result<()>;
}

/// Apply `delta`, never going below zero.
pub fn apply_delta(rating: u32, delta: i32) -> u32 {
    rating.saturating_add_signed(delta)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerStats {
    pub rating: u32,
    pub wins: u32,
    pub losses: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            rating: STARTING_RATING,
            wins: 0,
            losses: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
    pub match_id: MatchId,
    pub player: PlayerId,
    pub opponent: Option<PlayerId>,
    pub delta: i32,
    pub kind: ResultKind,
}

#[derive(Default)]
struct LedgerState {
    stats: HashMap<PlayerId, PlayerStats>,
    history: Vec<LedgerEntry>,
}

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a player's rating, e.g. to start from a stored profile.
    pub fn set_rating(&self, player: PlayerId, rating: u32) {
        if let Ok(mut state) = self.inner.lock() {
            state.stats.entry(player).or_default().rating = rating;
        }
    }

    pub fn stats(&self, player: PlayerId) -> PlayerStats {
        self.inner
            .lock()
            .ok()
            .and_then(|s| s.stats.get(&player).copied())
            .unwrap_or_default()
    }

    pub fn history(&self) -> Vec<LedgerEntry> {
        self.inner
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RatingLedger for InMemoryLedger {
    async fn record(&self, id: MatchId, change: RatingChange) -> anyhow::Result<()> {
        let RatingChange {
            player,
            opponent,
            delta,
            kind,
        } = change;
        let mut state = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))?;
        let stats = state.stats.entry(player).or_default();
        stats.rating = apply_delta(stats.rating, delta);
        match kind {
            ResultKind::Win => stats.wins += 1,
            ResultKind::Loss => stats.losses += 1,
        }
        let rating = stats.rating;
        state.history.push(LedgerEntry {
            match_id: id,
            player,
            opponent,
            delta,
            kind,
        });
        log::debug!("match {}: {} {:+} -> {}", id, player, delta, rating);
        Ok(())
    }
}
