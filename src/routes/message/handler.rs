use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::model::{CreateMessageRequest, Message};
use crate::{
    AppState,
    error::AppResult,
    extract::{Json, Path},
    middleware::Actor,
    routes::group::model::Group,
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(group_id): Path<i32>,
    Json(req): Json<CreateMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let new = req.validate()?;
    Group::accessible_by(&state.pool, group_id, &actor).await?;

    let message = Message::create(&state.pool, group_id, &actor, new).await?;
    // 消息已落库，推送失败不影响响应
    state.relay.publish(group_id, &message);

    Ok((
        StatusCode::CREATED,
        success_to_api_response(json!({ "mensagem": message })),
    ))
}

#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(group_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    Group::accessible_by(&state.pool, group_id, &actor).await?;
    let messages = Message::list_for_group(&state.pool, group_id).await?;
    tracing::debug!("Loaded {} messages for group {}", messages.len(), group_id);

    Ok(success_to_api_response(json!({ "mensagens": messages })))
}
