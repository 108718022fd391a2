use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::{
    AppState, chat,
    middleware::{auth_middleware, log_errors},
};

pub mod event;
pub mod favorite;
pub mod group;
pub mod guest;
pub mod message;
pub mod organizer;
pub mod ticket;

/// 全部接口，限流和 CORS 由 main 在外层添加
pub fn api_router(state: AppState) -> Router {
    let public_routes = Router::new()
        // 注册和登录
        .route("/cadastro/organizador", post(organizer::register))
        .route("/login/organizador", post(organizer::login))
        .route("/cadastro/convidado", post(guest::register))
        .route("/login/convidado", post(guest::login))
        // 公开的活动目录
        .route("/api/eventos/busca-nome", get(event::search_by_name))
        .route("/api/eventos/filtrados", get(event::list_public))
        .route("/api/eventos/categorias", get(event::categories))
        .route("/api/eventos/home", get(event::home))
        .route("/api/eventos/{id}", get(event::find_by_id))
        .route("/api/localizacoes", get(event::cities))
        // WebSocket 自己校验查询参数里的令牌
        .route("/ws/grupos/{grupoId}", get(chat::group_socket));

    let protected_routes = Router::new()
        // 活动管理
        .route("/eventos", post(event::create).get(event::list_mine))
        // 个人资料
        .route("/perfil/organizador", get(organizer::profile))
        .route(
            "/perfil/convidado",
            get(guest::profile).put(guest::update_profile),
        )
        // 购票与参与
        .route("/participar/evento/{ingressoId}", post(ticket::participate))
        .route(
            "/participacao/evento/{eventoId}",
            get(ticket::participation_status),
        )
        // 群组
        .route("/grupos/aderir", post(group::join))
        .route("/grupos/convidado", get(group::list_for_guest))
        .route("/grupos/organizador", get(group::list_for_organizer))
        // 收藏
        .route("/favoritos", get(favorite::list).post(favorite::add))
        .route("/favoritos/{eventoId}", delete(favorite::remove_event))
        .route(
            "/favoritos/organizador/{organizadorId}",
            delete(favorite::remove_organizer),
        )
        // 群组消息
        .route(
            "/mensagens/{grupoId}",
            get(message::get_messages).post(message::create_message),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(state.clone(), log_errors))
        .with_state(state)
}
