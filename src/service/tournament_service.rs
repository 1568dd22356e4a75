use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateTournamentRequest, Tournament, TournamentStatus};
use crate::store::{MatchStore, StoreError};

/// Tournament service errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("tournament not found")]
    NotFound,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

pub struct TournamentService {
    store: Arc<dyn MatchStore>,
}

impl TournamentService {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    pub async fn create_tournament(
        &self,
        request: CreateTournamentRequest,
    ) -> Result<Tournament, TournamentError> {
        request
            .validate()
            .map_err(|e| TournamentError::Validation(e.to_string()))?;

        let now = Utc::now();
        let tournament = Tournament {
            id: Uuid::new_v4(),
            name: request.name,
            game: request.game,
            status: TournamentStatus::Upcoming,
            tier_requirement: request.tier_requirement,
            entry_fee_cents: request.entry_fee_cents,
            prize: request.prize,
            capacity: request.capacity,
            rounds: None,
            starts_at: request.starts_at,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tournament(&tournament).await?;

        info!(
            tournament_id = %tournament.id,
            game = %tournament.game,
            capacity = tournament.capacity,
            "Tournament created"
        );
        Ok(tournament)
    }

    pub async fn get_tournament(&self, tournament_id: Uuid) -> Result<Tournament, TournamentError> {
        self.store
            .get_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound)
    }

    /// Move a tournament forward along upcoming -> ongoing -> completed.
    pub async fn transition_status(
        &self,
        tournament_id: Uuid,
        to: TournamentStatus,
    ) -> Result<Tournament, TournamentError> {
        let tournament = self.get_tournament(tournament_id).await?;
        if !tournament.status.can_transition_to(&to) {
            return Err(TournamentError::InvalidTransition {
                from: tournament.status,
                to,
            });
        }
        self.store.set_tournament_status(tournament_id, to).await?;
        info!(tournament_id = %tournament_id, status = %to, "Tournament status updated");
        self.get_tournament(tournament_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> TournamentService {
        TournamentService::new(Arc::new(InMemoryStore::new()))
    }

    fn request() -> CreateTournamentRequest {
        CreateTournamentRequest {
            name: "Midnight Mario Kart".to_string(),
            game: "MK8DX".to_string(),
            tier_requirement: None,
            entry_fee_cents: 0,
            prize: None,
            capacity: 8,
            starts_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_tournament() {
        let service = service();
        let created = service.create_tournament(request()).await.unwrap();
        assert_eq!(created.status, TournamentStatus::Upcoming);

        let fetched = service.get_tournament(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Midnight Mario Kart");

        let err = service.get_tournament(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, TournamentError::NotFound));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_request() {
        let service = service();
        let mut invalid = request();
        invalid.capacity = 1;
        let err = service.create_tournament(invalid).await.unwrap_err();
        assert!(matches!(err, TournamentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_status_never_reverses() {
        let service = service();
        let created = service.create_tournament(request()).await.unwrap();

        let ongoing = service
            .transition_status(created.id, TournamentStatus::Ongoing)
            .await
            .unwrap();
        assert_eq!(ongoing.status, TournamentStatus::Ongoing);

        let err = service
            .transition_status(created.id, TournamentStatus::Upcoming)
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::InvalidTransition { .. }));

        let completed = service
            .transition_status(created.id, TournamentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, TournamentStatus::Completed);
    }
}
