use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::model::{CreateGuestRequest, Guest, UpdateGuestRequest};
use crate::{
    AppState,
    error::{AppError, AppResult},
    extract::Json,
    middleware::Actor,
    routes::{favorite::model::Favorite, ticket::model::Purchase},
    utils::{ActorKind, generate_token, success_to_api_response, success_with_message},
};

#[derive(Debug, Deserialize)]
pub struct GuestLoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateGuestRequest>,
) -> AppResult<impl IntoResponse> {
    let guest = Guest::create(&state.pool, req).await?;
    tracing::info!("Guest registered: {}", guest.guest_id);

    Ok((
        StatusCode::CREATED,
        success_with_message("Cadastro realizado com sucesso", json!({ "data": guest })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<GuestLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let guest = Guest::login(&state.pool, &req.email, &req.password).await?;
    let (token, expires_at) = generate_token(guest.guest_id, ActorKind::Guest, &state.config)?;

    Ok(success_with_message(
        "Login realizado com sucesso",
        json!({
            "token": token,
            "expiraEm": expires_at,
            "convidado": guest,
        }),
    ))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Acesso não autorizado")?;
    let guest = Guest::find_by_id(&state.pool, guest_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Convidado não encontrado".into()))?;

    // 收藏和购买记录加载失败不影响个人资料返回
    let favorite_events = Favorite::list_events(&state.pool, guest_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load favorites for guest {}: {}", guest_id, e);
            Vec::new()
        });
    let purchases = Purchase::history_for_guest(&state.pool, guest_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load purchase history for guest {}: {}", guest_id, e);
            Vec::new()
        });

    let favorites_message =
        favorite_events.is_empty().then_some("Usuário não possui eventos favoritados");

    Ok(success_to_api_response(json!({
        "convidado": guest,
        "eventosFavoritos": favorite_events,
        "eventosFavoritosMensagem": favorites_message,
        "comprasHistorico": purchases,
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateGuestRequest>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Acesso não autorizado")?;
    let guest = Guest::update(&state.pool, guest_id, req).await?;

    Ok(success_with_message(
        "Perfil atualizado com sucesso",
        json!({ "convidado": guest }),
    ))
}
