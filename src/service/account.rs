//! Account service
//!
//! Handles registration and credential verification.

use std::sync::Arc;

use crate::data::{Database, EntityId, User};
use crate::error::AppError;

/// Input for a new registration, already shape-validated at the boundary
#[derive(Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new user
    ///
    /// Hashes the password and persists the user record. Username and
    /// email collisions surface as validation errors.
    pub async fn register(&self, input: NewAccount) -> Result<User, AppError> {
        if self
            .db
            .get_user_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::validation("username is already taken"));
        }

        let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

        let user = User {
            id: EntityId::new().0,
            username: input.username,
            email: input.email,
            password_hash,
            display_name: input.display_name,
            created_at: chrono::Utc::now(),
        };

        self.db.insert_user(&user).await?;

        tracing::info!(username = %user.username, "New user registered");

        Ok(user)
    }

    /// Verify login credentials
    ///
    /// The same error is returned for an unknown email and a wrong
    /// password so credential probing learns nothing.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self.db.get_user_by_email(email).await?.ok_or_else(invalid)?;

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password verification failed: {e}")))?;
        if !matches {
            return Err(invalid());
        }

        Ok(user)
    }
}
