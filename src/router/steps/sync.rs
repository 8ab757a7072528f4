//! Sync daily steps (upsert).

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::customer::Customer;
use crate::error::Result;
use crate::router::Valid;
use crate::steps::DailySteps;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Date is required."))]
    pub date: String,
    /// Full validation (format, non-negativity) happens in the ledger.
    pub steps: i64,
}

/// Handler creating or overwriting the record for (customer, day).
pub async fn handler(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Valid(body): Valid<Body>,
) -> Result<Json<DailySteps>> {
    let record = state
        .ledger
        .upsert(&customer.id, &body.date, body.steps)
        .await?;

    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::SqlitePool;

    use crate::router::customers::signup;
    use crate::steps::DailySteps;
    use crate::{app, make_request, router};

    #[sqlx::test]
    async fn test_sync_handler_upserts(pool: SqlitePool) {
        let state = router::state(pool.clone());
        let app = app(state.clone());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/customers/signup",
            None,
            signup::tests::body("jamie@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let (customer, token) = state
            .directory
            .authenticate("jamie@gmail.com", "hunter22")
            .await
            .unwrap();

        for steps in [1000, 4500] {
            let response = make_request(
                app.clone(),
                Method::POST,
                "/steps/sync",
                Some(&token),
                json!({ "date": "2024-01-03", "steps": steps }).to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        // Exactly one record, holding the later value.
        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM daily_steps WHERE customer_id = ?1",
        )
        .bind(&customer.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            state
                .ledger
                .day_total(&customer.id, "2024-01-03")
                .await
                .unwrap(),
            4500
        );
    }

    #[sqlx::test]
    async fn test_sync_rejects_malformed_body(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/customers/signup",
            None,
            signup::tests::body("jamie@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let (_, token) = state
            .directory
            .authenticate("jamie@gmail.com", "hunter22")
            .await
            .unwrap();

        for body in [
            json!({ "date": "03/01/2024", "steps": 100 }),
            json!({ "date": "2024-01-03", "steps": -1 }),
        ] {
            let response = make_request(
                app.clone(),
                Method::POST,
                "/steps/sync",
                Some(&token),
                body.to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        // No session, no sync.
        let response = make_request(
            app,
            Method::POST,
            "/steps/sync",
            None,
            json!({ "date": "2024-01-03", "steps": 100 }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_sync_response_echoes_record(pool: SqlitePool) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/customers/signup",
            None,
            signup::tests::body("jamie@gmail.com").to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let (_, token) = state
            .directory
            .authenticate("jamie@gmail.com", "hunter22")
            .await
            .unwrap();

        let response = make_request(
            app,
            Method::POST,
            "/steps/sync",
            Some(&token),
            json!({ "date": "2024-01-03", "steps": 2000 }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let record: DailySteps = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            record,
            DailySteps {
                date: "2024-01-03".to_owned(),
                steps: 2000
            }
        );
    }
}
