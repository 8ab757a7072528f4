//! Customers-related HTTP API.

mod delete;
mod list;
pub mod login;
pub mod signup;
mod update;
mod upload;

use axum::extract::multipart::MultipartError;
use axum::routing::{delete, get, patch, post};
use axum::{Router, middleware};

use crate::asset::Upload;
use crate::customer::CustomerChanges;
use crate::router::auth;
use crate::{AppState, ServerError};

const PICTURE_FIELD: &str = "profilePicture";

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // `GET /customers` goes to `list`.
        .route("/", get(list::handler))
        // `PATCH /customers/:ID` goes to `update`. Self-only.
        .route("/{customer_id}", patch(update::handler))
        // `DELETE /customers/:ID` goes to `delete`. Self-only.
        .route("/{customer_id}", delete(delete::handler))
        // `POST /customers/upload-image` replaces the profile picture.
        .route("/upload-image", post(upload::handler))
        .route_layer(middleware::from_fn_with_state(state, auth));

    Router::new()
        .route("/signup", post(signup::handler))
        .route("/login", post(login::handler))
        .merge(protected)
}

fn parsing(err: MultipartError) -> ServerError {
    ServerError::ParsingForm(Box::new(err))
}

/// Text fields and the optional picture part of a multipart customer
/// update.
#[derive(Debug, Default)]
pub(super) struct UpdateForm {
    pub changes: CustomerChanges,
    pub upload: Option<Upload>,
}

/// Collect the multipart stream into an [`UpdateForm`].
///
/// Unknown text fields are ignored; a file part under any other name than
/// `profilePicture` is rejected.
pub(super) async fn collect_form(
    mut multipart: axum::extract::Multipart,
) -> Result<UpdateForm, ServerError> {
    let mut form = UpdateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(parsing)? {
        let name = field.name().unwrap_or_default().to_owned();

        if let Some(file_name) = field.file_name() {
            if name != PICTURE_FIELD {
                let mut errors = validator::ValidationErrors::new();
                errors.add(
                    "profilePicture",
                    validator::ValidationError::new("invalid_field")
                        .with_message("Invalid field name for upload.".into()),
                );
                return Err(errors.into());
            }

            let file_name = file_name.to_owned();
            form.upload = Some(Upload {
                file_name,
                bytes: field.bytes().await.map_err(parsing)?,
            });
            continue;
        }

        let value = field.text().await.map_err(parsing)?;
        match name.as_str() {
            "name" => form.changes.name = Some(value),
            "email" => form.changes.email = Some(value),
            "phoneNumber" => form.changes.phone_number = Some(value),
            "password" => form.changes.password = Some(value),
            _ => (),
        }
    }

    Ok(form)
}
