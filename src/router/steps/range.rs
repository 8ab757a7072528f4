//! Steps for a date range.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use validator::{ValidationError, ValidationErrors};

use crate::customer::Customer;
use crate::error::Result;
use crate::steps::DailySteps;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct Params {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn missing_bounds() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "from",
        ValidationError::new("missing_bounds").with_message(
            "Both 'from' and 'to' date parameters are required.".into(),
        ),
    );
    errors
}

/// Handler returning the sparse, ascending sequence of records with
/// `from <= day <= to`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<DailySteps>>> {
    let (from, to) = params
        .from
        .zip(params.to)
        .ok_or_else(missing_bounds)?;

    let records = state.ledger.range(&customer.id, &from, &to).await?;
    Ok(Json(records))
}
