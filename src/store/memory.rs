use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{BracketMatch, SlotSide, Tournament, TournamentStatus};
use crate::store::{MatchStore, StoreError};

#[derive(Default)]
struct State {
    tournaments: HashMap<Uuid, Tournament>,
    matches: HashMap<Uuid, BracketMatch>,
    // Keyed slot index: (tournament, round, match_index) -> match id.
    slots: HashMap<(Uuid, i32, i32), Uuid>,
}

/// In-memory store backing the test suite.
///
/// A single mutex serializes every operation, so each trait method is atomic
/// as a whole; concurrent sibling propagations interleave only between
/// operations, where the merge semantics of `upsert_slot` keep both seats.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        state.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn get_tournament(&self, tournament_id: Uuid) -> Result<Option<Tournament>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state.tournaments.get(&tournament_id).cloned())
    }

    async fn set_tournament_status(
        &self,
        tournament_id: Uuid,
        status: TournamentStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(tournament) = state.tournaments.get_mut(&tournament_id) {
            tournament.status = status;
            tournament.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn open_tournament(&self, tournament_id: Uuid, rounds: i32) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(tournament) = state.tournaments.get_mut(&tournament_id) {
            tournament.status = TournamentStatus::Ongoing;
            tournament.rounds = Some(rounds);
            tournament.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_match(&self, bracket_match: &BracketMatch) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        let key = (
            bracket_match.tournament_id,
            bracket_match.round,
            bracket_match.match_index,
        );
        if state.slots.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "match already exists at round {} index {}",
                bracket_match.round, bracket_match.match_index
            )));
        }
        state.slots.insert(key, bracket_match.id);
        state.matches.insert(bracket_match.id, bracket_match.clone());
        Ok(())
    }

    async fn get_match(
        &self,
        tournament_id: Uuid,
        match_id: Uuid,
    ) -> Result<Option<BracketMatch>, StoreError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .matches
            .get(&match_id)
            .filter(|m| m.tournament_id == tournament_id)
            .cloned())
    }

    async fn list_matches(&self, tournament_id: Uuid) -> Result<Vec<BracketMatch>, StoreError> {
        let state = self.inner.lock().unwrap();
        let mut matches: Vec<BracketMatch> = state
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.match_index));
        Ok(matches)
    }

    async fn set_winner(&self, match_id: Uuid, winner_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.inner.lock().unwrap();
        match state.matches.get_mut(&match_id) {
            Some(m) if m.winner_id.is_none() => {
                m.winner_id = Some(winner_id);
                m.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_winner(&self, match_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(m) = state.matches.get_mut(&match_id) {
            m.winner_id = None;
            m.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn upsert_slot(
        &self,
        tournament_id: Uuid,
        round: i32,
        match_index: i32,
        side: SlotSide,
        player_id: Uuid,
    ) -> Result<BracketMatch, StoreError> {
        let mut state = self.inner.lock().unwrap();
        let key = (tournament_id, round, match_index);

        if let Some(&existing_id) = state.slots.get(&key) {
            let m = state
                .matches
                .get_mut(&existing_id)
                .expect("slot index points at a stored match");
            let seat = match side {
                SlotSide::Player1 => &mut m.player1_id,
                SlotSide::Player2 => &mut m.player2_id,
            };
            match *seat {
                None => *seat = Some(player_id),
                Some(occupant) if occupant == player_id => {}
                Some(occupant) => {
                    return Err(StoreError::Conflict(format!(
                        "{} seat of round {} index {} already held by {}",
                        side, round, match_index, occupant
                    )));
                }
            }
            m.updated_at = Utc::now();
            return Ok(m.clone());
        }

        let now = Utc::now();
        let created = BracketMatch {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            match_index,
            player1_id: (side == SlotSide::Player1).then_some(player_id),
            player2_id: (side == SlotSide::Player2).then_some(player_id),
            winner_id: None,
            created_at: now,
            updated_at: now,
        };
        state.slots.insert(key, created.id);
        state.matches.insert(created.id, created.clone());
        Ok(created)
    }
}
