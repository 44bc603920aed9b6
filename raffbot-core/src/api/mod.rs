//! src/api/mod.rs
//!
//! The two HTTP endpoints polled by the mini-app, plus a health probe.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use axum::http::{HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::{JoinService, RaffleService};

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub raffles: Arc<RaffleService>,
    pub joins: Arc<JoinService>,
}

impl ApiState {
    pub fn new(raffles: Arc<RaffleService>, joins: Arc<JoinService>) -> Self {
        Self { raffles, joins }
    }
}

/// Builds the API router. With `allowed_origin` unset any origin may call it,
/// which is what the mini-app needs when it is hosted separately.
pub fn router(state: ApiState, allowed_origin: Option<HeaderValue>) -> Router {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(origin)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/raffle", get(handlers::raffle_status))
        .route("/api/join", get(handlers::join_raffle))
        .route("/healthz", get(handlers::health))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}
