//! Customer login.

use axum::extract::State;
use axum::http::header;
use axum::response::AppendHeaders;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::customer::Customer;
use crate::error::Result;
use crate::router::Valid;
use crate::token::TOKEN_TYPE;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Please provide an email."))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide a password."))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub data: Customer,
}

/// Handler to authenticate a customer.
///
/// The session token is returned in the body and mirrored as an
/// `HttpOnly` cookie.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(
    AppendHeaders<[(header::HeaderName, String); 1]>,
    Json<Response>,
)> {
    let (customer, token) = state
        .directory
        .authenticate(&body.email, &body.password)
        .await?;

    let expires_in = state.token.ttl().as_secs();
    let cookie =
        format!("token={token}; HttpOnly; Path=/; Max-Age={expires_in}");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            expires_in,
            data: customer,
        }),
    ))
}
