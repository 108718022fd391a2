use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use redis::Client as RedisClient;
use serde::Deserialize;

use super::relay::channel_for;
use crate::{
    AppState,
    error::{AppError, AppResult},
    extract::{Path, Query},
    middleware::resolve_actor,
    routes::group::model::Group,
};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// 浏览器无法在握手时带 Authorization 头，令牌放在查询参数里
pub async fn group_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
    Query(query): Query<SocketQuery>,
) -> AppResult<Response> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Token não fornecido".into()))?;

    let actor = resolve_actor(&state.pool, &state.config, token.trim()).await?;
    Group::accessible_by(&state.pool, group_id, &actor).await?;

    tracing::info!("{} {} joined room {}", actor.kind(), actor.id(), channel_for(group_id));
    let redis = state.redis.clone();
    Ok(ws.on_upgrade(move |socket| forward_group_messages(socket, redis, group_id)))
}

async fn forward_group_messages(socket: WebSocket, redis: Arc<RedisClient>, group_id: i32) {
    let channel = channel_for(group_id);

    let mut pubsub = match redis.get_async_pubsub().await {
        Ok(pubsub) => pubsub,
        Err(e) => {
            tracing::warn!("Failed to open pubsub for {}: {}", channel, e);
            return;
        }
    };
    if let Err(e) = pubsub.subscribe(&channel).await {
        tracing::warn!("Failed to subscribe to {}: {}", channel, e);
        return;
    }

    let (mut sender, mut receiver) = socket.split();
    let mut published = std::pin::pin!(pubsub.on_message());

    loop {
        tokio::select! {
            msg = published.next() => {
                let Some(msg) = msg else { break };
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("Dropping undecodable payload on {}: {}", channel, e);
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("Socket for {} closed", channel);
}
