//! Daily step count domain.

mod ledger;

pub use ledger::*;

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::error::Result;

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// One step record: the value held for a (customer, calendar day) pair.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct DailySteps {
    pub date: String,
    pub steps: i64,
}

fn invalid_date(field: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("invalid_date")
            .with_message("Date must be a calendar day in YYYY-MM-DD format.".into()),
    );
    errors
}

/// Parse a `YYYY-MM-DD` calendar day.
///
/// Zero padding is required; chrono alone would accept `2024-1-3`.
pub(crate) fn parse_day(
    field: &'static str,
    value: &str,
) -> Result<chrono::NaiveDate> {
    if !DATE_REGEX.is_match(value) {
        return Err(invalid_date(field).into());
    }

    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| invalid_date(field).into())
}

/// Current date at the server's UTC day boundary.
pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
