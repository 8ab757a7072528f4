//! Customer directory: composes credential hashing, session issuance and
//! the profile asset lifecycle over the repository.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::asset::{AssetManager, Upload};
use crate::crypto::PasswordManager;
use crate::customer::{Customer, CustomerChanges, CustomerRepository};
use crate::error::{Result, ServerError};
use crate::token::TokenManager;

#[derive(Clone)]
pub struct CustomerDirectory {
    repo: CustomerRepository,
    crypto: Arc<PasswordManager>,
    token: TokenManager,
    assets: Arc<AssetManager>,
}

impl CustomerDirectory {
    /// Create a new [`CustomerDirectory`].
    pub fn new(
        pool: SqlitePool,
        crypto: Arc<PasswordManager>,
        token: TokenManager,
        assets: Arc<AssetManager>,
    ) -> Self {
        Self {
            repo: CustomerRepository::new(pool),
            crypto,
            token,
            assets,
        }
    }

    /// Register a new customer.
    ///
    /// Duplicate emails surface as `Conflict` from the storage constraint,
    /// even under concurrent registration.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        phone_number: &str,
    ) -> Result<Customer> {
        let customer = Customer {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_owned(),
            email: email.to_lowercase(),
            phone_number: phone_number.to_owned(),
            password: self.crypto.hash_password(password)?,
            profile_picture: None,
            created_at: chrono::Utc::now().naive_utc(),
        };

        self.repo.insert(&customer).await?;
        Ok(customer)
    }

    /// Verify credentials and mint a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller; the hash is still computed on the unknown-email path so the
    /// two branches cost about the same.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Customer, String)> {
        match self.repo.find_by_email(&email.to_lowercase()).await? {
            Some(customer)
                if self
                    .crypto
                    .verify_password(password, &customer.password) =>
            {
                let token = self.token.create(&customer.id)?;
                Ok((customer, token))
            },
            Some(_) => Err(ServerError::Unauthorized),
            None => {
                let _ = self.crypto.hash_password(password);
                Err(ServerError::Unauthorized)
            },
        }
    }

    /// Load a customer by ID.
    pub async fn find(&self, customer_id: &str) -> Result<Customer> {
        self.repo.find_by_id(customer_id).await
    }

    /// List every customer, credentials stripped.
    pub async fn list(&self) -> Result<Vec<Customer>> {
        self.repo.list().await
    }

    /// Apply a partial update, optionally replacing the profile picture.
    ///
    /// Self-only: `requester_id` must match `target_id`.
    pub async fn update(
        &self,
        requester_id: &str,
        target_id: &str,
        changes: CustomerChanges,
        upload: Option<Upload>,
    ) -> Result<Customer> {
        if requester_id != target_id {
            return Err(ServerError::Forbidden);
        }

        let mut customer = self.repo.find_by_id(target_id).await?;

        if let Some(name) = changes.name {
            customer.name = name;
        }
        if let Some(email) = changes.email {
            customer.email = email.to_lowercase();
        }
        if let Some(phone_number) = changes.phone_number {
            customer.phone_number = phone_number;
        }
        if let Some(password) = changes.password {
            // Re-hash only because the plaintext field was supplied.
            customer.password = self.crypto.hash_password(&password)?;
        }

        match upload {
            Some(upload) => {
                self.replace_picture(&mut customer, &upload).await?
            },
            None => self.repo.update(&customer).await?,
        }

        Ok(customer)
    }

    /// Replace the active profile picture of the requester.
    pub async fn set_picture(
        &self,
        requester_id: &str,
        upload: &Upload,
    ) -> Result<Customer> {
        let mut customer = self.repo.find_by_id(requester_id).await?;
        self.replace_picture(&mut customer, upload).await?;
        Ok(customer)
    }

    /// Store the new file, commit the reference swap, then reclaim the
    /// superseded file.
    ///
    /// The record update is the authoritative step; reclaim is
    /// fire-and-forget and skipped when both uploads resolved to the same
    /// path (same extension overwrites in place).
    async fn replace_picture(
        &self,
        customer: &mut Customer,
        upload: &Upload,
    ) -> Result<()> {
        let reference =
            self.assets.store_profile(&customer.id, upload).await?;
        let previous = customer.profile_picture.replace(reference);

        self.repo.update(customer).await?;

        if let Some(old) = previous {
            if customer.profile_picture.as_deref() != Some(old.as_str()) {
                self.assets.reclaim(&old).await;
            }
        }

        Ok(())
    }

    /// Delete a customer and reclaim its profile picture.
    ///
    /// Self-only; asset reclaim is best-effort and never blocks record
    /// deletion.
    pub async fn delete(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> Result<()> {
        if requester_id != target_id {
            return Err(ServerError::Forbidden);
        }

        let customer = self.repo.find_by_id(target_id).await?;
        self.repo.delete(&customer.id).await?;

        if let Some(reference) = customer.profile_picture {
            self.assets.reclaim(&reference).await;
        }

        Ok(())
    }
}
