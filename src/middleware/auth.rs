use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use sqlx::PgPool;

use crate::{
    AppState,
    config::Config,
    error::{AppError, AppResult},
    routes::{guest::model::Guest, organizer::model::Organizer},
    utils::{ActorKind, verify_token},
};

/// 已认证的调用方，按令牌里的类型查出对应记录
#[derive(Debug, Clone)]
pub enum Actor {
    Organizer(Organizer),
    Guest(Guest),
}

impl Actor {
    pub fn id(&self) -> i32 {
        match self {
            Actor::Organizer(organizer) => organizer.organizer_id,
            Actor::Guest(guest) => guest.guest_id,
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Organizer(_) => ActorKind::Organizer,
            Actor::Guest(_) => ActorKind::Guest,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Actor::Organizer(organizer) => &organizer.name,
            Actor::Guest(guest) => &guest.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Actor::Organizer(organizer) => &organizer.email,
            Actor::Guest(guest) => &guest.email,
        }
    }

    pub fn require_guest(&self, message: &str) -> AppResult<i32> {
        match self {
            Actor::Guest(guest) => Ok(guest.guest_id),
            Actor::Organizer(_) => Err(AppError::Forbidden(message.to_string())),
        }
    }

    pub fn require_organizer(&self) -> AppResult<i32> {
        match self {
            Actor::Organizer(organizer) => Ok(organizer.organizer_id),
            Actor::Guest(_) => Err(AppError::Forbidden(
                "Apenas organizadores podem realizar esta ação".into(),
            )),
        }
    }
}

/// 校验令牌并加载调用方记录，HTTP 和 WebSocket 共用
pub async fn resolve_actor(pool: &PgPool, config: &Config, token: &str) -> AppResult<Actor> {
    let claims = verify_token(token, config).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::InvalidCredential
    })?;
    let actor_id = claims.actor_id().ok_or(AppError::InvalidCredential)?;

    let actor = match claims.tipo {
        ActorKind::Organizer => Organizer::find_by_id(pool, actor_id)
            .await?
            .map(Actor::Organizer),
        ActorKind::Guest => Guest::find_by_id(pool, actor_id).await?.map(Actor::Guest),
    };

    actor.ok_or_else(|| {
        tracing::debug!("Token subject {} ({}) no longer exists", actor_id, claims.tipo);
        AppError::InvalidCredential
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthenticated("Token não fornecido".into()))?;

    let actor = resolve_actor(&state.pool, &state.config, bearer.token()).await?;
    tracing::debug!("Authenticated {} {}", actor.kind(), actor.id());

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
