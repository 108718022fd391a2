use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};

use crate::routes::message::model::MessageWithSender;

pub const NEW_MESSAGE_EVENT: &str = "nova_mensagem";

pub fn channel_for(group_id: i32) -> String {
    format!("grupo_{}", group_id)
}

/// 推送给 WebSocket 客户端的事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEvent<T> {
    #[serde(rename = "evento")]
    pub event: String,
    #[serde(rename = "dados")]
    pub data: T,
}

/// 通过 Redis 频道把新消息转发给在线成员
#[derive(Clone)]
pub struct ChatRelay {
    redis: Arc<RedisClient>,
}

impl ChatRelay {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    pub fn encode(message: &MessageWithSender) -> serde_json::Result<String> {
        serde_json::to_string(&RelayEvent {
            event: NEW_MESSAGE_EVENT.to_string(),
            data: message,
        })
    }

    /// 不等待发布结果，失败只记日志
    pub fn publish(&self, group_id: i32, message: &MessageWithSender) {
        let payload = match Self::encode(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode message for group {}: {}", group_id, e);
                return;
            }
        };
        let redis = self.redis.clone();

        tokio::spawn(async move {
            let channel = channel_for(group_id);
            let mut conn = match redis.get_multiplexed_async_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("No Redis connection to publish on {}: {}", channel, e);
                    return;
                }
            };

            let result: redis::RedisResult<i64> = conn.publish(&channel, payload).await;
            match result {
                Ok(receivers) => {
                    tracing::debug!("Published to {} ({} subscribers)", channel, receivers)
                }
                Err(e) => tracing::warn!("Failed to publish to {}: {}", channel, e),
            }
        });
    }
}
