// Service layer
pub mod bracket_service;
pub mod tournament_service;

#[cfg(test)]
mod bracket_service_test;

pub use bracket_service::{BracketError, BracketService};
pub use tournament_service::{TournamentError, TournamentService};
