//! HTTP surface: thin handlers delegating to `reservation_engine` and
//! `availability`. Router assembly follows the teacher's `main.rs` layering
//! of a `TraceLayer`/`CorsLayer` `ServiceBuilder` over a state-carrying
//! `Router`, split here into a public group and a bearer-gated group.

pub mod admin;
pub mod auth;
pub mod health;
pub mod ingredients;
pub mod internal;
pub mod menu;
pub mod reservations;
pub mod ws;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use std::time::Duration;

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/ingredients/:id", patch(ingredients::patch_ingredient))
        .route("/reservations", post(reservations::create))
        .route(
            "/reservations/:id",
            get(reservations::get_one).patch(reservations::update),
        )
        .route("/reservations/:id/commit", post(reservations::commit))
        .route("/reservations/:id/release", post(reservations::release))
        .route(
            "/admin/reservation-ttl",
            get(admin::get_ttl).patch(admin::patch_ttl),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/ingredients", get(ingredients::list))
        .route("/menu", get(menu::list))
        .route("/internal/expire_once", post(internal::expire_once))
        .route("/ws", get(ws::handler))
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(10)))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(middleware::from_fn(crate::request_id::propagate_request_id)),
        )
        .with_state(state)
}
