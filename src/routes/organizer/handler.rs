use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::model::{CreateOrganizerRequest, LoginRequest, Organizer};
use crate::{
    AppState,
    error::AppResult,
    extract::Json,
    middleware::Actor,
    utils::{ActorKind, generate_token, success_to_api_response, success_with_message},
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateOrganizerRequest>,
) -> AppResult<impl IntoResponse> {
    let organizer = Organizer::create(&state.pool, req).await?;
    tracing::info!("Organizer registered: {}", organizer.organizer_id);

    Ok((
        StatusCode::CREATED,
        success_with_message(
            "Usuário cadastrado com sucesso!",
            json!({ "organizador": organizer }),
        ),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let organizer = Organizer::login(&state.pool, &req).await?;
    let (token, expires_at) =
        generate_token(organizer.organizer_id, ActorKind::Organizer, &state.config)?;

    Ok(success_with_message(
        "Login bem-sucedido",
        json!({
            "token": token,
            "expiraEm": expires_at,
            "organizador": organizer,
        }),
    ))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let organizer_id = actor.require_organizer()?;
    let profile = Organizer::profile(&state.pool, organizer_id).await?;

    Ok(success_to_api_response(json!({ "perfil": profile })))
}
