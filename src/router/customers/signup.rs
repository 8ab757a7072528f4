//! Customer registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::customer::Customer;
use crate::error::Result;
use crate::router::Valid;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Name must not be empty."
    ))]
    pub name: String,
    #[validate(custom(
        function = "crate::router::validate_email",
        message = "Email must be a valid Gmail address (example@gmail.com)."
    ))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 255,
        message = "Password must be at least 6 characters long."
    ))]
    pub password: String,
    #[validate(custom(
        function = "crate::router::validate_phone",
        message = "Phone number must be exactly 10 digits."
    ))]
    pub phone_number: String,
}

/// Handler to create a customer.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = state
        .directory
        .register(&body.name, &body.email, &body.password, &body.phone_number)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::SqlitePool;

    use crate::{app, make_request, router};

    pub(crate) fn body(email: &str) -> serde_json::Value {
        json!({
            "name": "Jamie",
            "email": email,
            "password": "hunter22",
            "phoneNumber": "0123456789",
        })
    }

    #[sqlx::test]
    async fn test_signup_handler(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app,
            Method::POST,
            "/customers/signup",
            None,
            body("jamie@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let customer: serde_json::Value =
            serde_json::from_slice(&bytes).unwrap();
        assert_eq!(customer["email"], "jamie@gmail.com");
        assert_eq!(customer["profilePicture"], serde_json::Value::Null);
        // Credential material never appears in a returned representation.
        assert!(customer.get("password").is_none());
    }

    #[sqlx::test]
    async fn test_signup_duplicate_email_is_conflict(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app.clone(),
            Method::POST,
            "/customers/signup",
            None,
            body("jamie@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Case-insensitive collision.
        let response = make_request(
            app,
            Method::POST,
            "/customers/signup",
            None,
            body("JAMIE@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_signup_rejects_malformed_fields(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state);

        for body in [
            json!({
                "name": "Jamie",
                "email": "jamie@example.com", // policy requires gmail.com
                "password": "hunter22",
                "phoneNumber": "0123456789",
            }),
            json!({
                "name": "Jamie",
                "email": "jamie@gmail.com",
                "password": "tiny", // below minimum length
                "phoneNumber": "0123456789",
            }),
            json!({
                "name": "Jamie",
                "email": "jamie@gmail.com",
                "password": "hunter22",
                "phoneNumber": "123", // not 10 digits
            }),
        ] {
            let response = make_request(
                app.clone(),
                Method::POST,
                "/customers/signup",
                None,
                body.to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
