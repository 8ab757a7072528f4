//! Steps-related HTTP API.

mod range;
mod sync;
mod today;

use axum::routing::{get, post};
use axum::{Router, middleware};

use crate::router::auth;
use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST /steps/sync` upserts one day. Authorization required.
        .route("/sync", post(sync::handler))
        // `GET /steps/today` goes to `today`. Authorization required.
        .route("/today", get(today::handler))
        // `GET /steps/range` goes to `range`. Authorization required.
        .route("/range", get(range::handler))
        .route_layer(middleware::from_fn_with_state(state, auth))
}
