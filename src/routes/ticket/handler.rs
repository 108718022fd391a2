use axum::{
    extract::{Extension, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::model::{Participation, ParticipationState};
use crate::{
    AppState,
    error::AppResult,
    extract::Path,
    middleware::Actor,
    routes::group::model::Group,
    utils::{success_to_api_response, success_with_message},
};

#[derive(Debug, Default, Deserialize)]
pub struct ParticipateRequest {
    #[serde(rename = "quantidade")]
    pub quantity: Option<i32>,
}

#[axum::debug_handler]
pub async fn participate(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(ticket_id): Path<i32>,
    body: Result<axum::Json<ParticipateRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let guest_id =
        actor.require_guest("Apenas convidados podem participar de eventos desta forma.")?;
    // 请求体可以省略，数量默认为 1
    let quantity = match body {
        Ok(axum::Json(req)) => req.quantity.unwrap_or(1),
        Err(JsonRejection::MissingJsonContentType(_)) => 1,
        Err(rejection) => return Err(rejection.into()),
    };

    let outcome = Participation::participate(&state.pool, guest_id, ticket_id, quantity).await?;

    // 入群失败只记录日志
    let group = match Group::join_event_group(&state.pool, guest_id, outcome.event_id).await {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!(
                "Guest {} could not join the group of event {}: {}",
                guest_id,
                outcome.event_id,
                e
            );
            None
        }
    };

    let (status, message) = match (outcome.newly_confirmed, outcome.purchase.is_some()) {
        (true, _) => (
            StatusCode::CREATED,
            "Participação confirmada com sucesso (Simulação de Pagamento).",
        ),
        (false, true) => (StatusCode::OK, "Participação já confirmada. Compra registrada."),
        (false, false) => (StatusCode::OK, "Participação já confirmada."),
    };

    Ok((
        status,
        success_with_message(
            message,
            json!({
                "participacao": outcome.participation,
                "compra": outcome.purchase,
                "eventoId": outcome.event_id,
                "novaParticipacao": outcome.newly_confirmed,
                "grupo": group,
            }),
        ),
    ))
}

/// 非访客返回 "Não Aplicável"，不报错
#[axum::debug_handler]
pub async fn participation_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let status = match &actor {
        Actor::Guest(guest) => {
            Participation::status_for_event(&state.pool, guest.guest_id, event_id).await?
        }
        Actor::Organizer(_) => ParticipationState::NotApplicable,
    };

    Ok(success_to_api_response(json!({ "status": status })))
}
