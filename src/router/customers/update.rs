//! Update customer profile.

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use validator::{ValidationError, ValidationErrors};

use crate::customer::{Customer, CustomerChanges};
use crate::error::Result;
use crate::router::{validate_email, validate_phone};
use crate::AppState;

/// Validate supplied fields only; absent fields stay untouched.
///
/// A supplied empty string is a validation error, never "clear the
/// field".
fn validate_changes(changes: &CustomerChanges) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if let Some(name) = &changes.name {
        if name.is_empty() || name.chars().count() > 50 {
            errors.add(
                "name",
                ValidationError::new("invalid_name")
                    .with_message("Name must be 1 to 50 characters long.".into()),
            );
        }
    }
    if let Some(email) = &changes.email {
        if validate_email(email).is_err() {
            errors.add(
                "email",
                ValidationError::new("invalid_email").with_message(
                    "Email must be a valid Gmail address (example@gmail.com)."
                        .into(),
                ),
            );
        }
    }
    if let Some(password) = &changes.password {
        if password.chars().count() < 6 {
            errors.add(
                "password",
                ValidationError::new("invalid_password").with_message(
                    "Password must be at least 6 characters long.".into(),
                ),
            );
        }
    }
    if let Some(phone_number) = &changes.phone_number {
        if validate_phone(phone_number).is_err() {
            errors.add(
                "phoneNumber",
                ValidationError::new("invalid_phone").with_message(
                    "Phone number must be exactly 10 digits.".into(),
                ),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Handler applying a partial profile update with an optional picture
/// part. Self-only.
pub async fn handler(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Extension(requester): Extension<Customer>,
    multipart: Multipart,
) -> Result<Json<Customer>> {
    let form = super::collect_form(multipart).await?;
    validate_changes(&form.changes)?;

    let customer = state
        .directory
        .update(&requester.id, &customer_id, form.changes, form.upload)
        .await?;

    Ok(Json(customer))
}
