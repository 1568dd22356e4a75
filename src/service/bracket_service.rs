use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    BracketMatch, BracketResponse, NextSlot, SeedBracketRequest, TournamentStatus, WinnerRecorded,
};
use crate::store::{MatchStore, StoreError};

/// Bracket service errors
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("tournament not found")]
    TournamentNotFound,

    #[error("match not found")]
    MatchNotFound,

    #[error("player {0} is not seated in this match")]
    InvalidWinner(Uuid),

    #[error("match already has a recorded winner")]
    AlreadyDecided,

    #[error("bracket already seeded")]
    AlreadySeeded,

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Single-elimination bracket manager: records winners, propagates them into
/// the next round, seeds round 1.
pub struct BracketService {
    store: Arc<dyn MatchStore>,
}

impl BracketService {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    // =============================================================================
    // RECORD WINNER
    // =============================================================================

    /// Record a match's winner and place them into the seat of the
    /// next-round match their bracket position feeds, creating that match if
    /// no sibling has resolved yet. The final round propagates nowhere; it
    /// crowns the champion and completes the tournament.
    ///
    /// A match is decided at most once: re-invocation fails with
    /// `AlreadyDecided` rather than re-running propagation.
    pub async fn record_winner(
        &self,
        tournament_id: Uuid,
        match_id: Uuid,
        winner_id: Uuid,
    ) -> Result<WinnerRecorded, BracketError> {
        let tournament = self
            .store
            .get_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound)?;
        let mut decided = self
            .store
            .get_match(tournament_id, match_id)
            .await?
            .ok_or(BracketError::MatchNotFound)?;

        if !decided.seats(winner_id) {
            return Err(BracketError::InvalidWinner(winner_id));
        }
        if decided.is_decided() {
            return Err(BracketError::AlreadyDecided);
        }

        // Commit point. The conditional write loses cleanly when a
        // concurrent call decided this match first, and the loser stops
        // here, before touching the next round.
        if !self.store.set_winner(decided.id, winner_id).await? {
            return Err(BracketError::AlreadyDecided);
        }
        decided.winner_id = Some(winner_id);

        if decided.round >= tournament.final_round() {
            self.store
                .set_tournament_status(tournament_id, TournamentStatus::Completed)
                .await?;
            info!(
                tournament_id = %tournament_id,
                champion = %winner_id,
                "Final decided, champion crowned"
            );
            return Ok(WinnerRecorded {
                decided,
                next_match: None,
                champion: Some(winner_id),
            });
        }

        let slot = NextSlot::feeding(decided.round, decided.match_index);
        let next_match = match self
            .store
            .upsert_slot(tournament_id, slot.round, slot.match_index, slot.side, winner_id)
            .await
        {
            Ok(next_match) => next_match,
            Err(err) => {
                // Leave no half-applied result behind.
                warn!(
                    match_id = %decided.id,
                    error = %err,
                    "Propagation failed, rolling winner back"
                );
                self.store.clear_winner(decided.id).await?;
                return Err(err.into());
            }
        };

        info!(
            tournament_id = %tournament_id,
            match_id = %decided.id,
            winner = %winner_id,
            next_round = slot.round,
            next_index = slot.match_index,
            seat = %slot.side,
            "Winner recorded and advanced"
        );

        Ok(WinnerRecorded {
            decided,
            next_match: Some(next_match),
            champion: None,
        })
    }

    // =============================================================================
    // SEEDING
    // =============================================================================

    /// Lay out round 1 and open the tournament.
    ///
    /// Seed i plays the mirrored seed (draw - 1 - i) over a power-of-two
    /// draw, so a short field produces bye matches that always have the
    /// higher seed in player1 and never an empty pair. Byes are auto-won
    /// through the normal record path, which advances them into round 2.
    pub async fn seed_bracket(
        &self,
        tournament_id: Uuid,
        request: SeedBracketRequest,
    ) -> Result<BracketResponse, BracketError> {
        request
            .validate()
            .map_err(|e| BracketError::InvalidField(e.to_string()))?;

        let tournament = self
            .store
            .get_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound)?;
        if tournament.status != TournamentStatus::Upcoming {
            return Err(BracketError::AlreadySeeded);
        }

        let players = &request.player_ids;
        if players.len() > tournament.capacity as usize {
            return Err(BracketError::InvalidField(format!(
                "field of {} exceeds capacity {}",
                players.len(),
                tournament.capacity
            )));
        }
        let unique: HashSet<&Uuid> = players.iter().collect();
        if unique.len() != players.len() {
            return Err(BracketError::InvalidField(
                "duplicate player in field".to_string(),
            ));
        }

        let draw_size = players.len().next_power_of_two();
        let now = Utc::now();
        let mut byes = Vec::new();
        for index in 0..draw_size / 2 {
            let seeded = BracketMatch {
                id: Uuid::new_v4(),
                tournament_id,
                round: 1,
                match_index: index as i32,
                player1_id: Some(players[index]),
                player2_id: players.get(draw_size - 1 - index).copied(),
                winner_id: None,
                created_at: now,
                updated_at: now,
            };
            self.store.insert_match(&seeded).await.map_err(|e| match e {
                StoreError::Conflict(_) => BracketError::AlreadySeeded,
                other => BracketError::Storage(other),
            })?;
            if seeded.is_bye() {
                byes.push(seeded);
            }
        }

        let depth = (draw_size.trailing_zeros() as i32).max(1);
        self.store.open_tournament(tournament_id, depth).await?;
        info!(
            tournament_id = %tournament_id,
            field = players.len(),
            draw = draw_size,
            rounds = depth,
            byes = byes.len(),
            "Bracket seeded"
        );

        for bye in byes {
            if let Some(walkover) = bye.player1_id {
                self.record_winner(tournament_id, bye.id, walkover).await?;
            }
        }

        self.bracket(tournament_id).await
    }

    // =============================================================================
    // VIEW
    // =============================================================================

    pub async fn bracket(&self, tournament_id: Uuid) -> Result<BracketResponse, BracketError> {
        if self.store.get_tournament(tournament_id).await?.is_none() {
            return Err(BracketError::TournamentNotFound);
        }
        let matches = self.store.list_matches(tournament_id).await?;
        Ok(BracketResponse::from_matches(tournament_id, matches))
    }
}
