#![cfg(feature = "std")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::game::{Match, MatchId, Side};
use crate::grid::Grid;

/// Durable storage for match records and their grids.
///
/// Records are keyed by match id, grids by (match id, side). The service
/// loads before every mutation and commits after it. A commit writes the
/// record and both grids together: either all three land or none do.
#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    async fn load_match(&self, id: MatchId) -> anyhow::Result<Option<Match>>;
    async fn load_grid(&self, id: MatchId, side: Side) -> anyhow::Result<Option<Grid>>;
    async fn commit(&self, record: &Match, host: &Grid, guest: &Grid) -> anyhow::Result<()>;
}

#[derive(Default)]
struct StoreState {
    matches: HashMap<MatchId, Vec<u8>>,
    grids: HashMap<(MatchId, Side), Vec<u8>>,
}

/// Process-local store. Everything is kept as bincode blobs so loads go
/// through the same validation a real backend would.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of match records held.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.matches.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("store lock poisoned")
}

#[async_trait::async_trait]
impl MatchStore for InMemoryStore {
    async fn load_match(&self, id: MatchId) -> anyhow::Result<Option<Match>> {
        let state = self.inner.lock().map_err(poisoned)?;
        match state.matches.get(&id) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_grid(&self, id: MatchId, side: Side) -> anyhow::Result<Option<Grid>> {
        let state = self.inner.lock().map_err(poisoned)?;
        match state.grids.get(&(id, side)) {
            Some(bytes) => Ok(Some(Grid::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    async fn commit(&self, record: &Match, host: &Grid, guest: &Grid) -> anyhow::Result<()> {
        // encode everything before touching the maps
        let id = record.id();
        let record_bytes = bincode::serialize(record)?;
        let host_bytes = host.to_bytes()?;
        let guest_bytes = guest.to_bytes()?;

        let mut state = self.inner.lock().map_err(poisoned)?;
        state.grids.insert((id, Side::Host), host_bytes);
        state.grids.insert((id, Side::Guest), guest_bytes);
        state.matches.insert(id, record_bytes);
        Ok(())
    }
}
