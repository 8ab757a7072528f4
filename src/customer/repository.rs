//! Handle database requests for customers.

use sqlx::SqlitePool;

use crate::customer::Customer;
use crate::error::{Result, ServerError};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone_number, password, profile_picture, created_at";

#[derive(Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Create a new [`CustomerRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Map a unique-constraint violation onto [`ServerError::Conflict`].
    ///
    /// The email unique index is the only one on the table, so concurrent
    /// duplicate inserts surface here rather than corrupting state.
    fn conflict_on_unique(err: sqlx::Error) -> ServerError {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            ServerError::Conflict("email")
        } else {
            err.into()
        }
    }

    /// Insert [`Customer`] into database.
    pub async fn insert(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO customers (id, name, email, phone_number, password, profile_picture, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(&customer.password)
        .bind(customer.profile_picture.as_deref())
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(Self::conflict_on_unique)?;

        Ok(())
    }

    /// Find a customer using `id` field.
    pub async fn find_by_id(&self, customer_id: &str) -> Result<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound("customer"))
    }

    /// Find a customer using `email` field.
    ///
    /// Absence is not an error here: the login path must not distinguish
    /// an unknown email from a wrong password.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Persist the mutable fields of a customer.
    pub async fn update(&self, customer: &Customer) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE customers
                SET name = ?1, email = ?2, phone_number = ?3, password = ?4, profile_picture = ?5
                WHERE id = ?6"#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(&customer.password)
        .bind(customer.profile_picture.as_deref())
        .bind(&customer.id)
        .execute(&self.pool)
        .await
        .map_err(Self::conflict_on_unique)?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("customer"));
        }

        Ok(())
    }

    /// Delete a customer record.
    pub async fn delete(&self, customer_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("customer"));
        }

        Ok(())
    }

    /// List every customer.
    pub async fn list(&self) -> Result<Vec<Customer>> {
        Ok(sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, email: &str) -> Customer {
        Customer {
            id: id.to_owned(),
            name: "Jamie".to_owned(),
            email: email.to_owned(),
            phone_number: "0123456789".to_owned(),
            password: "$argon2id$fake".to_owned(),
            profile_picture: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[sqlx::test]
    async fn test_insert_and_find(pool: SqlitePool) {
        let repo = CustomerRepository::new(pool);

        repo.insert(&customer("c1", "jamie@gmail.com")).await.unwrap();

        let found = repo.find_by_id("c1").await.unwrap();
        assert_eq!(found.email, "jamie@gmail.com");

        let by_email = repo.find_by_email("jamie@gmail.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, "c1");

        assert!(matches!(
            repo.find_by_id("ghost").await,
            Err(ServerError::NotFound("customer"))
        ));
        assert!(repo.find_by_email("ghost@gmail.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_email_is_conflict(pool: SqlitePool) {
        let repo = CustomerRepository::new(pool);

        repo.insert(&customer("c1", "jamie@gmail.com")).await.unwrap();

        // Same address, different casing: the constraint is
        // case-insensitive.
        let err =
            repo.insert(&customer("c2", "Jamie@Gmail.com")).await.unwrap_err();
        assert!(matches!(err, ServerError::Conflict("email")));
    }

    #[sqlx::test]
    async fn test_update_email_collision_is_conflict(pool: SqlitePool) {
        let repo = CustomerRepository::new(pool);

        repo.insert(&customer("c1", "first@gmail.com")).await.unwrap();
        repo.insert(&customer("c2", "second@gmail.com")).await.unwrap();

        let mut second = repo.find_by_id("c2").await.unwrap();
        second.email = "first@gmail.com".to_owned();
        assert!(matches!(
            repo.update(&second).await,
            Err(ServerError::Conflict("email"))
        ));
    }

    #[sqlx::test]
    async fn test_delete_cascades_to_steps(pool: SqlitePool) {
        let repo = CustomerRepository::new(pool.clone());

        repo.insert(&customer("c1", "jamie@gmail.com")).await.unwrap();
        sqlx::query(
            "INSERT INTO daily_steps (customer_id, date, steps, updated_at)
                VALUES ('c1', '2024-01-03', 2000, ?1)",
        )
        .bind(chrono::Utc::now().naive_utc())
        .execute(&pool)
        .await
        .unwrap();

        repo.delete("c1").await.unwrap();

        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM daily_steps")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rows, 0);

        assert!(matches!(
            repo.delete("c1").await,
            Err(ServerError::NotFound("customer"))
        ));
    }
}
