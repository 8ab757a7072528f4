//! List customers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub count: usize,
    pub data: Vec<Customer>,
}

/// Handler returning every customer, credentials stripped.
///
/// Unpaginated by design.
pub async fn handler(
    State(state): State<AppState>,
) -> Result<Json<Response>> {
    let customers = state.directory.list().await?;

    Ok(Json(Response {
        count: customers.len(),
        data: customers,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;

    use crate::router::customers::signup;
    use crate::{app, make_request, router};

    #[sqlx::test]
    async fn test_list_requires_session(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app,
            Method::GET,
            "/customers",
            None,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_list_handler(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state.clone());

        for email in ["first@gmail.com", "second@gmail.com"] {
            let response = make_request(
                app.clone(),
                Method::POST,
                "/customers/signup",
                None,
                signup::tests::body(email).to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let customer = state
            .directory
            .authenticate("first@gmail.com", "hunter22")
            .await
            .unwrap()
            .0;
        let token = state.token.create(&customer.id).unwrap();

        let response = make_request(
            app,
            Method::GET,
            "/customers",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["count"], 2);
        for entry in body["data"].as_array().unwrap() {
            assert!(entry.get("password").is_none());
        }
    }
}
