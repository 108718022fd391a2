use std::sync::Arc;

use config::Config;
use redis::Client as RedisClient;
use sqlx::PgPool;

pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod utils;

pub mod routes;

use chat::ChatRelay;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub relay: ChatRelay,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, redis: RedisClient) -> Self {
        let redis = Arc::new(redis);
        Self {
            pool,
            config,
            relay: ChatRelay::new(redis.clone()),
            redis,
        }
    }
}
