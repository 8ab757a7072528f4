//! Stridebook is a lightweight account and daily-step-count backend for a
//! fitness application.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
pub mod asset;
pub mod config;
pub mod crypto;
pub mod customer;
pub mod database;
pub mod error;
pub mod router;
pub mod steps;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::Router;
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tower_http::LatencyUnit;

// Headroom over the upload ceiling for multipart framing and text fields.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub token: token::TokenManager,
    pub assets: Arc<asset::AssetManager>,
    pub directory: customer::CustomerDirectory,
    pub ledger: steps::StepsLedger,
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[cfg(test)]
pub(crate) const MULTIPART_BOUNDARY: &str = "stridebook-test-boundary";

/// Build a multipart/form-data payload from text fields and
/// (field, file name, content) file parts.
#[cfg(test)]
pub(crate) fn multipart_body(
    texts: &[(&str, &str)],
    files: &[(&str, &str, &str)],
) -> String {
    let mut body = String::new();
    for (name, value) in texts {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, file_name, content) in files {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"{name}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));
    body
}

#[cfg(test)]
pub(crate) fn multipart_text(texts: &[(&str, &str)]) -> String {
    multipart_body(texts, &[])
}

#[cfg(test)]
pub(crate) async fn make_multipart_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder().method(method).uri(path).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
    );
    if let Some(token) = token {
        request = request
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let body_limit = state
        .config
        .uploads
        .as_ref()
        .and_then(|uploads| uploads.max_bytes)
        .unwrap_or(config::DEFAULT_MAX_UPLOAD_BYTES) as usize
        + BODY_LIMIT_OVERHEAD;

    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/customers", router::customers::router(state.clone()))
        .nest("/steps", router::steps::router(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let database_config = config.database.clone().unwrap_or_default();
    let db = database::Database::new(
        database_config
            .path
            .as_deref()
            .unwrap_or(config::DEFAULT_DATABASE_PATH),
        database_config.pool_size.unwrap_or(config::DEFAULT_POOL_SIZE),
    )
    .await?;

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.pool).await?;

    let secret = std::env::var("SECRET")
        .expect("missing `SECRET` environnement variable");

    let crypto =
        Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    let ttl_days = config
        .token
        .as_ref()
        .and_then(|token| token.ttl_days)
        .unwrap_or(config::DEFAULT_TTL_DAYS);
    let token = token::TokenManager::new(
        &config.url,
        secret,
        Duration::from_secs(ttl_days * token::DAY_IN_SECONDS),
    );

    let uploads = config.uploads.clone().unwrap_or_default();
    let assets = Arc::new(asset::AssetManager::new(
        uploads
            .directory
            .unwrap_or_else(|| config::DEFAULT_UPLOAD_DIR.into()),
        uploads.max_bytes,
    ));

    let directory = customer::CustomerDirectory::new(
        db.pool.clone(),
        crypto,
        token.clone(),
        Arc::clone(&assets),
    );
    let ledger = steps::StepsLedger::new(db.pool.clone());

    Ok(AppState {
        config,
        db,
        token,
        assets,
        directory,
        ledger,
    })
}
