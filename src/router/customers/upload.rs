//! Profile picture upload.

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use validator::{ValidationError, ValidationErrors};

use crate::customer::Customer;
use crate::error::Result;
use crate::AppState;

fn missing_file() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "profilePicture",
        ValidationError::new("missing_file")
            .with_message("Please upload a photo file.".into()),
    );
    errors
}

/// Handler replacing the requester's profile picture.
pub async fn handler(
    State(state): State<AppState>,
    Extension(requester): Extension<Customer>,
    multipart: Multipart,
) -> Result<Json<Customer>> {
    let form = super::collect_form(multipart).await?;
    let upload = form.upload.ok_or_else(missing_file)?;

    let customer = state.directory.set_picture(&requester.id, &upload).await?;
    Ok(Json(customer))
}
