use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use raffbot_common::models::Raffle;

use crate::services::JoinError;

/// Body of `GET /api/raffle` for a known raffle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleStatus {
    pub ok: bool,
    pub participants: Vec<String>,
    pub end_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<String>>,
}

impl From<Raffle> for RaffleStatus {
    fn from(raffle: Raffle) -> Self {
        Self {
            ok: true,
            participants: raffle.participants,
            end_at: raffle.end_at.map(format_timestamp),
            winners: raffle.winners,
        }
    }
}

/// ISO-8601 in UTC with millisecond precision, the format browsers produce
/// with `Date.prototype.toISOString`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{ ok: false }` with no further detail.
pub fn plain_failure(status: StatusCode) -> Response {
    (status, Json(json!({ "ok": false }))).into_response()
}

/// `{ ok: true }`.
pub fn success() -> Response {
    (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
}

impl JoinError {
    pub fn code(&self) -> &'static str {
        match self {
            JoinError::NotFound => "NOT_FOUND",
            JoinError::Ended => "ENDED",
            JoinError::NotSubscribed(_) => "NOT_SUBSCRIBED",
            JoinError::Transient(_) => "TRANSIENT",
            JoinError::BadRequest(_) => "BAD_REQUEST",
            JoinError::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            JoinError::NotFound => StatusCode::NOT_FOUND,
            JoinError::Ended => StatusCode::GONE,
            JoinError::NotSubscribed(_) => StatusCode::FORBIDDEN,
            JoinError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            JoinError::BadRequest(_) => StatusCode::BAD_REQUEST,
            JoinError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for JoinError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            JoinError::NotSubscribed(channels) => json!({
                "ok": false,
                "error": self.code(),
                "notSubs": channels,
            }),
            // Internal details stay in the logs.
            JoinError::Internal(_) => json!({ "ok": false }),
            _ => json!({ "ok": false, "error": self.code() }),
        };

        (status, Json(body)).into_response()
    }
}
