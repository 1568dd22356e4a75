use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{BracketMatch, SlotSide, Tournament, TournamentStatus};
use crate::store::{MatchStore, StoreError};

/// Postgres-backed store.
///
/// Concurrency contract: the winner write is a single conditional UPDATE
/// guarded on `winner_id IS NULL`, and the slot write is a single
/// INSERT .. ON CONFLICT statement whose COALESCE assignments only fill
/// empty seats. Both are atomic at the row level, so no read-then-write
/// window exists for sibling propagations to lose an update in.
#[derive(Clone)]
pub struct PgMatchStore {
    pool: DbPool,
}

impl PgMatchStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error, round: i32, match_index: i32) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(format!(
            "match already exists at round {} index {}",
            round, match_index
        )),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tournaments (
                id, name, game, status, tier_requirement, entry_fee_cents,
                prize, capacity, rounds, starts_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(&tournament.game)
        .bind(tournament.status)
        .bind(&tournament.tier_requirement)
        .bind(tournament.entry_fee_cents)
        .bind(&tournament.prize)
        .bind(tournament.capacity)
        .bind(tournament.rounds)
        .bind(tournament.starts_at)
        .bind(tournament.created_at)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_tournament(&self, tournament_id: Uuid) -> Result<Option<Tournament>, StoreError> {
        let tournament = sqlx::query_as::<_, Tournament>(
            r#"
            SELECT id, name, game, status, tier_requirement, entry_fee_cents,
                   prize, capacity, rounds, starts_at, created_at, updated_at
            FROM tournaments
            WHERE id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tournament)
    }

    async fn set_tournament_status(
        &self,
        tournament_id: Uuid,
        status: TournamentStatus,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE tournaments
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(tournament_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn open_tournament(&self, tournament_id: Uuid, rounds: i32) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE tournaments
            SET status = $2, rounds = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(tournament_id)
        .bind(TournamentStatus::Ongoing)
        .bind(rounds)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_match(&self, bracket_match: &BracketMatch) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO matches (
                id, tournament_id, round, match_index,
                player1_id, player2_id, winner_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(bracket_match.id)
        .bind(bracket_match.tournament_id)
        .bind(bracket_match.round)
        .bind(bracket_match.match_index)
        .bind(bracket_match.player1_id)
        .bind(bracket_match.player2_id)
        .bind(bracket_match.winner_id)
        .bind(bracket_match.created_at)
        .bind(bracket_match.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, bracket_match.round, bracket_match.match_index))?;
        Ok(())
    }

    async fn get_match(
        &self,
        tournament_id: Uuid,
        match_id: Uuid,
    ) -> Result<Option<BracketMatch>, StoreError> {
        let bracket_match = sqlx::query_as::<_, BracketMatch>(
            r#"
            SELECT id, tournament_id, round, match_index,
                   player1_id, player2_id, winner_id, created_at, updated_at
            FROM matches
            WHERE tournament_id = $1 AND id = $2
            "#,
        )
        .bind(tournament_id)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bracket_match)
    }

    async fn list_matches(&self, tournament_id: Uuid) -> Result<Vec<BracketMatch>, StoreError> {
        let matches = sqlx::query_as::<_, BracketMatch>(
            r#"
            SELECT id, tournament_id, round, match_index,
                   player1_id, player2_id, winner_id, created_at, updated_at
            FROM matches
            WHERE tournament_id = $1
            ORDER BY round, match_index
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(matches)
    }

    async fn set_winner(&self, match_id: Uuid, winner_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE matches
            SET winner_id = $2, updated_at = NOW()
            WHERE id = $1 AND winner_id IS NULL
            "#,
        )
        .bind(match_id)
        .bind(winner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn clear_winner(&self, match_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE matches
            SET winner_id = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(match_id)
        .execute(&self.pool)
        .await?;
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
        let (player1_id, player2_id) = match side {
            SlotSide::Player1 => (Some(player_id), None),
            SlotSide::Player2 => (None, Some(player_id)),
        };

        let bracket_match = sqlx::query_as::<_, BracketMatch>(
            r#"
            INSERT INTO matches (
                id, tournament_id, round, match_index, player1_id, player2_id
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tournament_id, round, match_index)
            DO UPDATE SET
                player1_id = COALESCE(matches.player1_id, EXCLUDED.player1_id),
                player2_id = COALESCE(matches.player2_id, EXCLUDED.player2_id),
                updated_at = NOW()
            RETURNING id, tournament_id, round, match_index,
                      player1_id, player2_id, winner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tournament_id)
        .bind(round)
        .bind(match_index)
        .bind(player1_id)
        .bind(player2_id)
        .fetch_one(&self.pool)
        .await?;

        // The COALESCE keeps an occupant in place; surface that instead of
        // reporting a write that did not happen.
        let seated = match side {
            SlotSide::Player1 => bracket_match.player1_id,
            SlotSide::Player2 => bracket_match.player2_id,
        };
        match seated {
            Some(occupant) if occupant != player_id => Err(StoreError::Conflict(format!(
                "{} seat of round {} index {} already held by {}",
                side, round, match_index, occupant
            ))),
            _ => Ok(bracket_match),
        }
    }
}
