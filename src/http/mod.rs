pub mod bracket_handler;
pub mod health;
pub mod tournament_handler;

use std::sync::Arc;

use crate::service::{BracketService, TournamentService};

/// Application state shared by the route handlers
pub struct AppState {
    pub tournament_service: Arc<TournamentService>,
    pub bracket_service: Arc<BracketService>,
}
