use actix_web::{web, HttpResponse, Responder};
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::http::AppState;
use crate::models::{RecordWinnerRequest, SeedBracketRequest};

/// POST /api/tournaments/:id/bracket/seed
/// Lay out round 1 and open the tournament
pub async fn seed_bracket(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<SeedBracketRequest>,
) -> Result<impl Responder, ApiError> {
    let tournament_id = path.into_inner();

    info!(
        tournament_id = %tournament_id,
        field = req.player_ids.len(),
        "Received seed bracket request"
    );

    let bracket = state
        .bracket_service
        .seed_bracket(tournament_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(bracket))
}

/// GET /api/tournaments/:id/bracket
pub async fn get_bracket(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let tournament_id = path.into_inner();
    let bracket = state.bracket_service.bracket(tournament_id).await?;

    Ok(HttpResponse::Ok().json(bracket))
}

/// POST /api/tournaments/:id/matches/:match_id/winner
/// Record a match result and advance the winner
pub async fn record_winner(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<RecordWinnerRequest>,
) -> Result<impl Responder, ApiError> {
    let (tournament_id, match_id) = path.into_inner();

    info!(
        tournament_id = %tournament_id,
        match_id = %match_id,
        winner = %req.winner_id,
        "Received record winner request"
    );

    let outcome = state
        .bracket_service
        .record_winner(tournament_id, match_id, req.winner_id)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
