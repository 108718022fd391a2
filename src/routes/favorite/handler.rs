use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::model::{AddFavoriteRequest, Favorite, FavoriteTarget};
use crate::{
    AppState,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    middleware::Actor,
    utils::{success_to_api_response, success_with_message},
};

#[derive(Debug, Deserialize)]
pub struct ListFavoritesQuery {
    pub tipo: Option<String>,
}

#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListFavoritesQuery>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados podem acessar favoritos")?;

    let body = match query.tipo.as_deref().unwrap_or("evento") {
        "evento" => {
            let events = Favorite::list_events(&state.pool, guest_id).await?;
            json!({ "eventosFavoritos": events })
        }
        "organizador" => {
            let organizers = Favorite::list_organizers(&state.pool, guest_id).await?;
            json!({ "organizadoresFavoritos": organizers })
        }
        other => {
            return Err(AppError::Validation(format!(
                "Tipo de favorito inválido: {}",
                other
            )));
        }
    };

    Ok(success_to_api_response(body))
}

#[axum::debug_handler]
pub async fn add(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<AddFavoriteRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados podem favoritar")?;
    let Json(req) = body?;
    let target = FavoriteTarget::try_from(req)?;

    let (favorite, created) = Favorite::add(&state.pool, guest_id, target).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        success_to_api_response(json!({
            "favorito": favorite,
            "created": created,
        })),
    ))
}

#[axum::debug_handler]
pub async fn remove_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados podem remover favoritos")?;
    Favorite::remove(&state.pool, guest_id, FavoriteTarget::Event(event_id)).await?;

    Ok(success_with_message("Favorito removido", json!({})))
}

#[axum::debug_handler]
pub async fn remove_organizer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(organizer_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let guest_id = actor.require_guest("Apenas convidados podem remover favoritos")?;
    Favorite::remove(&state.pool, guest_id, FavoriteTarget::Organizer(organizer_id)).await?;

    Ok(success_with_message("Favorito removido", json!({})))
}
