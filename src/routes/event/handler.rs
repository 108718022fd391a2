use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::filter::{CATEGORIES, Period, PublicEventFilters, PublicEventQuery, filter_by_period};
use super::model::{CreateEventRequest, Event, Location};
use crate::{
    AppState,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    middleware::Actor,
    utils::{success_to_api_response, success_with_message},
};

const DEFAULT_SEARCH_LIMIT: i64 = 10;
const DEFAULT_HOME_LIMIT: i64 = 16;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    /// 非数字时使用默认值，搜索接口不因参数格式报错
    pub limite: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub periodo: Option<String>,
    pub categoria: Option<String>,
    pub limite: Option<i64>,
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateEventRequest>, AppError>,
) -> AppResult<impl IntoResponse> {
    let organizer_id = actor.require_organizer()?;
    let Json(req) = body?;
    let new = req.validate()?;
    let created = Event::create(&state.pool, organizer_id, new).await?;

    Ok((
        StatusCode::CREATED,
        success_with_message("Evento criado com sucesso!", created),
    ))
}

#[axum::debug_handler]
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let organizer_id = actor.require_organizer()?;
    let events = Event::list_by_organizer(&state.pool, organizer_id).await?;

    Ok(success_to_api_response(json!({ "eventos": events })))
}

#[axum::debug_handler]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<PublicEventQuery>,
) -> AppResult<impl IntoResponse> {
    let filters = PublicEventFilters::from(query);
    let page = Event::list_public(&state.pool, &filters).await?;

    Ok(success_to_api_response(page))
}

/// 搜索出错时返回空结果而不是 500
#[axum::debug_handler]
pub async fn search_by_name(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let term = query.query.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::Validation(
            "Parâmetro de busca é obrigatório".into(),
        ));
    }
    let limit = query
        .limite
        .as_deref()
        .and_then(|l| l.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, 100);

    match Event::search_by_name(&state.pool, term, limit).await {
        Ok(events) => {
            tracing::debug!("Search for {:?} found {} events", term, events.len());
            let total = events.len();
            Ok(success_to_api_response(json!({
                "eventos": events,
                "total": total,
            })))
        }
        Err(e) => {
            tracing::error!("Event search for {:?} failed: {}", term, e);
            Ok(success_with_message(
                "Nenhum evento encontrado",
                json!({ "eventos": [], "total": 0 }),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn find_by_id(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let event = Event::find_by_id(&state.pool, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Evento não encontrado".into()))?;

    Ok(success_to_api_response(json!({ "evento": event })))
}

#[axum::debug_handler]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
) -> AppResult<impl IntoResponse> {
    let category = query
        .categoria
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let limit = query.limite.unwrap_or(DEFAULT_HOME_LIMIT).clamp(1, 100);

    let mut events = Event::list_home(&state.pool, category, limit).await?;

    if let Some(raw) = query.periodo.as_deref().filter(|p| !p.is_empty()) {
        match raw.parse::<Period>() {
            Ok(period) => {
                events = filter_by_period(events, period, Local::now().date_naive());
            }
            Err(()) => tracing::debug!("Ignoring unknown period {:?}", raw),
        }
    }

    let total = events.len();
    Ok(success_to_api_response(json!({
        "eventos": events,
        "total": total,
    })))
}

pub async fn categories() -> AppResult<impl IntoResponse> {
    Ok(success_to_api_response(json!({ "categorias": CATEGORIES })))
}

#[axum::debug_handler]
pub async fn cities(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let cities = Location::list_cities(&state.pool).await?;

    Ok(success_to_api_response(json!({ "localizacoes": cities })))
}
