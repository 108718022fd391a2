use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::model::{Group, JoinGroupRequest};
use crate::{
    AppState,
    error::{AppError, AppResult},
    extract::Json,
    middleware::Actor,
    utils::{success_to_api_response, success_with_message},
};

#[axum::debug_handler]
pub async fn join(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<JoinGroupRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados podem aderir a grupos")?;
    let Json(req) = body?;
    let event_id = req
        .event_id
        .ok_or_else(|| AppError::Validation("ID do evento é obrigatório".into()))?;

    let outcome = Group::join_event_group(&state.pool, guest_id, event_id).await?;

    let (status, message) = if outcome.already_member {
        (StatusCode::OK, "Convidado já é membro do grupo.")
    } else {
        (StatusCode::CREATED, "Convidado adicionado ao grupo com sucesso.")
    };

    Ok((status, success_with_message(message, json!({ "grupo": outcome }))))
}

#[axum::debug_handler]
pub async fn list_for_guest(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados possuem grupos")?;
    let groups = Group::list_for_guest(&state.pool, guest_id).await?;

    Ok(success_to_api_response(json!({ "grupos": groups })))
}

#[axum::debug_handler]
pub async fn list_for_organizer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let organizer_id = actor.require_organizer()?;
    let groups = Group::list_for_organizer(&state.pool, organizer_id).await?;

    Ok(success_to_api_response(json!({ "grupos": groups })))
}
