pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgMatchStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BracketMatch, SlotSide, Tournament, TournamentStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Persistence seam for tournaments and bracket matches.
///
/// Implementations must make `set_winner` and `upsert_slot` atomic with
/// respect to concurrent calls against the same row: `set_winner` only
/// succeeds while the winner is unset, and `upsert_slot` merges into the
/// keyed slot without ever overwriting an occupied seat. Those two contracts
/// are what keeps concurrent sibling completions from losing an update.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError>;

    async fn get_tournament(&self, tournament_id: Uuid) -> Result<Option<Tournament>, StoreError>;

    async fn set_tournament_status(
        &self,
        tournament_id: Uuid,
        status: TournamentStatus,
    ) -> Result<(), StoreError>;

    /// Move a freshly seeded tournament to ongoing, recording the depth of
    /// the laid-out draw.
    async fn open_tournament(&self, tournament_id: Uuid, rounds: i32) -> Result<(), StoreError>;

    async fn insert_match(&self, bracket_match: &BracketMatch) -> Result<(), StoreError>;

    async fn get_match(
        &self,
        tournament_id: Uuid,
        match_id: Uuid,
    ) -> Result<Option<BracketMatch>, StoreError>;

    async fn list_matches(&self, tournament_id: Uuid) -> Result<Vec<BracketMatch>, StoreError>;

    /// Set the winner if and only if it is still unset. Returns false when
    /// another caller decided the match first.
    async fn set_winner(&self, match_id: Uuid, winner_id: Uuid) -> Result<bool, StoreError>;

    /// Compensation for a propagation failure after the winner committed.
    async fn clear_winner(&self, match_id: Uuid) -> Result<(), StoreError>;

    /// Place a player into one seat of the match at (tournament, round,
    /// match_index), creating the match if it does not exist yet. The other
    /// seat and an already-occupied seat are left untouched.
    async fn upsert_slot(
        &self,
        tournament_id: Uuid,
        round: i32,
        match_index: i32,
        side: SlotSide,
        player_id: Uuid,
    ) -> Result<BracketMatch, StoreError>;
}
