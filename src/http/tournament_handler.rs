use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::http::AppState;
use crate::models::{CreateTournamentRequest, TournamentStatus};

/// POST /api/tournaments
pub async fn create_tournament(
    state: web::Data<AppState>,
    req: web::Json<CreateTournamentRequest>,
) -> Result<impl Responder, ApiError> {
    info!(name = %req.name, game = %req.game, "Received create tournament request");

    let tournament = state
        .tournament_service
        .create_tournament(req.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(tournament))
}

/// GET /api/tournaments/:id
pub async fn get_tournament(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let tournament_id = path.into_inner();
    let tournament = state
        .tournament_service
        .get_tournament(tournament_id)
        .await?;

    Ok(HttpResponse::Ok().json(tournament))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TournamentStatus,
}

/// POST /api/tournaments/:id/status
/// Move the tournament forward along its lifecycle
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateStatusRequest>,
) -> Result<impl Responder, ApiError> {
    let tournament_id = path.into_inner();

    info!(
        tournament_id = %tournament_id,
        status = %req.status,
        "Received status update request"
    );

    let tournament = state
        .tournament_service
        .transition_status(tournament_id, req.status)
        .await?;

    Ok(HttpResponse::Ok().json(tournament))
}
