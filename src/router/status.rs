//! Instance status route.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;

/// Public instance metadata. Sensitive sections are skipped at the
/// serialization level.
pub async fn status(
    State(config): State<Arc<Configuration>>,
) -> Json<Configuration> {
    Json((*config).clone())
}
