use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One match in a single-elimination bracket.
///
/// Within a tournament, (round, match_index) uniquely identifies a match.
/// Round 1 is laid out at seeding time; deeper rounds are created lazily as
/// feeder matches resolve. A seat stays empty until the feeding match below
/// it has a winner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BracketMatch {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub round: i32,
    pub match_index: i32,
    pub player1_id: Option<Uuid>,
    pub player2_id: Option<Uuid>,
    pub winner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BracketMatch {
    pub fn is_decided(&self) -> bool {
        self.winner_id.is_some()
    }

    /// Whether the given player occupies one of this match's two seats.
    pub fn seats(&self, player_id: Uuid) -> bool {
        self.player1_id == Some(player_id) || self.player2_id == Some(player_id)
    }

    /// A bye: only one seat filled at seeding time, auto-won by that player.
    pub fn is_bye(&self) -> bool {
        self.player1_id.is_some() != self.player2_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotSide {
    Player1,
    Player2,
}

impl std::fmt::Display for SlotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotSide::Player1 => write!(f, "player1"),
            SlotSide::Player2 => write!(f, "player2"),
        }
    }
}

/// The next-round seat a finished match feeds into.
///
/// The bracket is a binary tree encoded by (round, match_index) alone: match
/// m of round r sends its winner to match ⌊m/2⌋ of round r+1, into the
/// player1 seat when m is even and the player2 seat when m is odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextSlot {
    pub round: i32,
    pub match_index: i32,
    pub side: SlotSide,
}

impl NextSlot {
    pub fn feeding(round: i32, match_index: i32) -> Self {
        let side = if match_index % 2 == 0 {
            SlotSide::Player1
        } else {
            SlotSide::Player2
        };
        NextSlot {
            round: round + 1,
            match_index: match_index / 2,
            side,
        }
    }
}

// ===== API DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordWinnerRequest {
    pub winner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedBracketRequest {
    #[validate(length(min = 2))]
    pub player_ids: Vec<Uuid>,
}

/// Outcome of recording a winner: the decided match, the next-round match
/// the winner was placed into (absent for the final), and the champion when
/// the final was just decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerRecorded {
    #[serde(rename = "match")]
    pub decided: BracketMatch,
    pub next_match: Option<BracketMatch>,
    pub champion: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundView {
    pub round: i32,
    pub matches: Vec<BracketMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketResponse {
    pub tournament_id: Uuid,
    pub rounds: Vec<RoundView>,
}

impl BracketResponse {
    /// Group matches by round, ordered by (round, match_index).
    pub fn from_matches(tournament_id: Uuid, mut matches: Vec<BracketMatch>) -> Self {
        matches.sort_by_key(|m| (m.round, m.match_index));

        let mut rounds: Vec<RoundView> = Vec::new();
        for m in matches {
            match rounds.last_mut() {
                Some(view) if view.round == m.round => view.matches.push(m),
                _ => rounds.push(RoundView {
                    round: m.round,
                    matches: vec![m],
                }),
            }
        }

        BracketResponse {
            tournament_id,
            rounds,
        }
    }
}
