use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, error, warn};

use raffbot_common::error::Error;

use super::responses::{plain_failure, success, RaffleStatus};
use super::ApiState;
use crate::services::JoinError;

/// Query string of `GET /api/raffle?id=...`.
#[derive(Debug, Deserialize)]
pub struct RaffleQuery {
    id: Option<String>,
}

/// Query string of `GET /api/join?id=...&userId=...&username=...`.
///
/// Everything is optional and parsed by hand so malformed requests still get
/// the JSON failure body instead of axum's plain-text rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQuery {
    id: Option<String>,
    user_id: Option<String>,
    username: Option<String>,
}

pub async fn raffle_status(
    State(state): State<ApiState>,
    query: Result<Query<RaffleQuery>, QueryRejection>,
) -> Response {
    let Some(id) = query.ok().and_then(|Query(q)| q.id).filter(|id| !id.is_empty()) else {
        return plain_failure(StatusCode::BAD_REQUEST);
    };

    match state.raffles.get_raffle(&id).await {
        Ok(raffle) => {
            debug!("Status of raffle id={}: {} participant(s)", id, raffle.participants.len());
            (StatusCode::OK, Json(RaffleStatus::from(raffle))).into_response()
        }
        Err(Error::NotFound(_)) => plain_failure(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to read raffle id={}: {:?}", id, e);
            plain_failure(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn join_raffle(
    State(state): State<ApiState>,
    query: Result<Query<JoinQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return JoinError::BadRequest("unreadable query string".into()).into_response();
    };
    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        return JoinError::BadRequest("missing raffle id".into()).into_response();
    };
    let user_id = match query.user_id.as_deref().map(str::trim).map(str::parse::<i64>) {
        Some(Ok(user_id)) => user_id,
        _ => return JoinError::BadRequest("missing or invalid userId".into()).into_response(),
    };

    match state.joins.join(&id, user_id, query.username.as_deref()).await {
        Ok(_) => success(),
        Err(e) => {
            if let JoinError::Internal(inner) = &e {
                error!("Join of user {} into raffle id={} failed: {:?}", user_id, id, inner);
            } else {
                warn!("Join of user {} into raffle id={} refused: {}", user_id, id, e);
            }
            e.into_response()
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}
