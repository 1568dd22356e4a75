use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tournament lifecycle. Transitions only move forward, never back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "tournament_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl TournamentStatus {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, to: &TournamentStatus) -> bool {
        match (self, to) {
            (TournamentStatus::Upcoming, TournamentStatus::Ongoing) => true,
            (TournamentStatus::Ongoing, TournamentStatus::Completed) => true,
            // Same state is allowed (idempotency)
            (a, b) if a == b => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentStatus::Completed)
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Upcoming => write!(f, "upcoming"),
            TournamentStatus::Ongoing => write!(f, "ongoing"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub game: String,
    pub status: TournamentStatus,
    pub tier_requirement: Option<String>,
    pub entry_fee_cents: i64,
    pub prize: Option<String>,
    pub capacity: i32,
    /// Bracket depth, recorded when round 1 is laid out. None until seeded.
    pub rounds: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    /// Round number of the final. Once seeded this is the depth of the
    /// actual draw; before that, the depth of a full-capacity draw,
    /// ceil(log2(capacity)).
    pub fn final_round(&self) -> i32 {
        if let Some(rounds) = self.rounds {
            return rounds.max(1);
        }
        let mut size = 1i32;
        let mut rounds = 0i32;
        while size < self.capacity {
            size *= 2;
            rounds += 1;
        }
        rounds.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTournamentRequest {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub game: String,
    #[validate(length(max = 50))]
    pub tier_requirement: Option<String>,
    #[validate(range(min = 0))]
    pub entry_fee_cents: i64,
    #[validate(length(max = 255))]
    pub prize: Option<String>,
    #[validate(range(min = 2, max = 256))]
    pub capacity: i32,
    pub starts_at: DateTime<Utc>,
}
