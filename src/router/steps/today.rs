//! Today's steps.

use axum::extract::State;
use axum::{Extension, Json};

use crate::customer::Customer;
use crate::error::Result;
use crate::steps::DailySteps;
use crate::AppState;

/// Handler returning the step count for the current UTC day.
///
/// A day with no record is zero steps, never an error.
pub async fn handler(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
) -> Result<Json<DailySteps>> {
    let date = crate::steps::today();
    let steps = state.ledger.day_total(&customer.id, &date).await?;

    Ok(Json(DailySteps { date, steps }))
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
    async fn test_today_defaults_to_zero(pool: SqlitePool) {
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
            app.clone(),
            Method::GET,
            "/steps/today",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let record: DailySteps = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record.date, crate::steps::today());
        assert_eq!(record.steps, 0);

        // Sync today's count, then read it back.
        let response = make_request(
            app.clone(),
            Method::POST,
            "/steps/sync",
            Some(&token),
            json!({ "date": crate::steps::today(), "steps": 1234 })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app,
            Method::GET,
            "/steps/today",
            Some(&token),
            String::default(),
        )
        .await;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let record: DailySteps = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record.steps, 1234);
    }
}
