//! Delete customer account.

use axum::extract::{Path, State};
use axum::Extension;

use crate::customer::Customer;
use crate::error::Result;
use crate::AppState;

/// Handler deleting a customer and reclaiming its profile picture.
/// Self-only.
pub async fn handler(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Extension(requester): Extension<Customer>,
) -> Result<()> {
    state.directory.delete(&requester.id, &customer_id).await
}
