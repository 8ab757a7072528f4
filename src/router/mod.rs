//! HTTP API.

pub mod customers;
pub mod status;
pub mod steps;

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::customer::Customer;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";
const COOKIE_NAME: &str = "token";

// Restricted address-format policy inherited from the mobile client.
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[^\s@]+@gmail\.com$").unwrap());
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());

pub(crate) fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// JSON extractor running `validator` rules before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn token_from_cookies(req: &Request) -> Option<String> {
    req.headers()
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_owned())
}

/// Custom middleware for authentification.
///
/// Accepts the session token from the `Authorization` header or the
/// session cookie, loads the customer it asserts, and injects it as a
/// request extension. Any failure is a uniform `Unauthorized`.
pub(crate) async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|token| token.replace(BEARER, ""))
        .or_else(|| token_from_cookies(&req))
        .ok_or(ServerError::Unauthorized)?;

    let claims = state.token.decode(&token)?;

    // A token may outlive its account; treat a missing customer as an
    // invalid session rather than leaking existence.
    let customer = state
        .directory
        .find(&claims.sub)
        .await
        .map_err(|_| ServerError::Unauthorized)?;

    req.extensions_mut().insert::<Customer>(customer);
    Ok(next.run(req).await)
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) fn state(pool: sqlx::SqlitePool) -> AppState {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::asset::AssetManager;
    use crate::crypto::PasswordManager;
    use crate::customer::CustomerDirectory;
    use crate::steps::StepsLedger;
    use crate::token::{DAY_IN_SECONDS, TokenManager};

    let config = Arc::new(crate::config::Configuration {
        name: "stridebook-test".to_owned(),
        url: "https://fitness.example.com/".to_owned(),
        ..Default::default()
    });

    // Cheap hashing parameters; only the contract is under test.
    let crypto = Arc::new(
        PasswordManager::new(Some(crate::config::Argon2 {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .expect("cannot build password manager"),
    );
    let token = TokenManager::new(
        &config.url,
        "test-secret",
        Duration::from_secs(30 * DAY_IN_SECONDS),
    );
    let assets_root = std::env::temp_dir()
        .join(format!("stridebook-test-{}", uuid::Uuid::new_v4()));
    let assets = Arc::new(AssetManager::new(assets_root, None));

    AppState {
        directory: CustomerDirectory::new(
            pool.clone(),
            crypto,
            token.clone(),
            Arc::clone(&assets),
        ),
        ledger: StepsLedger::new(pool.clone()),
        db: crate::database::Database { pool },
        assets,
        token,
        config,
    }
}
