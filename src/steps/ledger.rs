//! Handle database requests for daily step records.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::steps::{DailySteps, parse_day};

fn negative_steps() -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    errors.add(
        "steps",
        validator::ValidationError::new("invalid_steps")
            .with_message("Steps must be a non-negative number.".into()),
    );
    errors
}

/// Upsert-based store for (customer, day) step counts.
///
/// The primary key over (customer_id, date) guarantees exactly one record
/// per pair; concurrency is handled by the atomic upsert, never by
/// check-then-write.
#[derive(Clone)]
pub struct StepsLedger {
    pool: SqlitePool,
}

impl StepsLedger {
    /// Create a new [`StepsLedger`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create or overwrite the record for (customer, day).
    ///
    /// Last write wins; there is no merge or sum semantics. Backfilling a
    /// past day is allowed by design.
    pub async fn upsert(
        &self,
        customer_id: &str,
        date: &str,
        steps: i64,
    ) -> Result<DailySteps> {
        parse_day("date", date)?;
        if steps < 0 {
            return Err(negative_steps().into());
        }

        sqlx::query(
            r#"INSERT INTO daily_steps (customer_id, date, steps, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (customer_id, date)
                DO UPDATE SET steps = excluded.steps, updated_at = excluded.updated_at"#,
        )
        .bind(customer_id)
        .bind(date)
        .bind(steps)
        .bind(chrono::Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(DailySteps {
            date: date.to_owned(),
            steps,
        })
    }

    /// Step count for one day; absence means zero, never an error.
    pub async fn day_total(
        &self,
        customer_id: &str,
        date: &str,
    ) -> Result<i64> {
        parse_day("date", date)?;

        let steps: Option<i64> = sqlx::query_scalar(
            "SELECT steps FROM daily_steps WHERE customer_id = ?1 AND date = ?2",
        )
        .bind(customer_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(steps.unwrap_or(0))
    }

    /// Records with `from <= date <= to`, ascending by day.
    ///
    /// Sparse: days without a record are omitted, not zero-filled.
    pub async fn range(
        &self,
        customer_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<DailySteps>> {
        let first = parse_day("from", from)?;
        let last = parse_day("to", to)?;

        if first > last {
            let mut errors = validator::ValidationErrors::new();
            errors.add(
                "from",
                validator::ValidationError::new("invalid_range").with_message(
                    "'from' date must be before or equal to 'to' date.".into(),
                ),
            );
            return Err(errors.into());
        }

        Ok(sqlx::query_as::<_, DailySteps>(
            r#"SELECT date, steps FROM daily_steps
                WHERE customer_id = ?1 AND date >= ?2 AND date <= ?3
                ORDER BY date ASC"#,
        )
        .bind(customer_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }
}
