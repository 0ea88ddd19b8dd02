//! User repository for database operations.
//!
//! Queries are bound at runtime and mapped through [`UserRow`] so the domain
//! type never leaks raw column values.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dailyrep_core::{CustomerId, Email, SubscriptionId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{Address, PaymentLink, Profile, User};

/// How long a password reset token stays valid.
const RESET_TOKEN_TTL_SECONDS: f64 = 60.0 * 60.0;

const USER_COLUMNS: &str = "id, email, first_name, last_name, gender, phone, \
     city, state, line1, postal_code, customer_id, subscription_id, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    city: Option<String>,
    state: Option<String>,
    line1: Option<String>,
    postal_code: Option<String>,
    customer_id: Option<String>,
    subscription_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, RepositoryError> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            email,
            profile: Profile {
                first_name: r.first_name,
                last_name: r.last_name,
                gender: r.gender,
                phone: r.phone,
            },
            address: Address {
                city: r.city,
                state: r.state,
                line1: r.line1,
                postal_code: r.postal_code,
            },
            payment: PaymentLink {
                customer_id: r.customer_id.map(CustomerId::from),
                subscription_id: r.subscription_id.map(SubscriptionId::from),
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Repository for member database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a member by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a member by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new member with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email) VALUES ($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        let user = User::try_from(row)?;

        sqlx::query("INSERT INTO user_passwords (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a member and their password hash by email.
    ///
    /// Returns `None` if the member doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(UserId, String)> = sqlx::query_as(
            "SELECT u.id, p.password_hash
             FROM users u
             JOIN user_passwords p ON u.id = p.user_id
             WHERE u.email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some((id, password_hash)) = row else {
            return Ok(None);
        };

        let user = self
            .get_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(Some((user, password_hash)))
    }

    /// Replace a member's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member has no password row.
    pub async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE user_passwords SET password_hash = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Update a member's profile and address fields.
    ///
    /// All optional fields are overwritten, so a cleared form field clears
    /// the stored value too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        profile: &Profile,
        address: &Address,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET
                first_name = $2, last_name = $3, gender = $4, phone = $5,
                city = $6, state = $7, line1 = $8, postal_code = $9,
                updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.gender)
        .bind(&profile.phone)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.line1)
        .bind(&address.postal_code)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Store the gateway customer id for a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    pub async fn set_customer_id(
        &self,
        user_id: UserId,
        customer_id: &CustomerId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET customer_id = $2, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .bind(customer_id.as_str())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the gateway subscription id for a member.
    ///
    /// Guarded so a subscription id can never be stored without a customer
    /// id already in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the member has no customer id,
    /// or `RepositoryError::NotFound` if the member doesn't exist.
    pub async fn set_subscription_id(
        &self,
        user_id: UserId,
        subscription_id: &SubscriptionId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET subscription_id = $2, updated_at = now()
             WHERE id = $1 AND customer_id IS NOT NULL",
        )
        .bind(user_id)
        .bind(subscription_id.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if self.get_by_id(user_id).await?.is_some() {
                return Err(RepositoryError::Conflict(
                    "subscription requires a gateway customer".to_owned(),
                ));
            }
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Drop the stored subscription id after a cancellation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    pub async fn clear_subscription_id(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET subscription_id = NULL, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a member and their password and token rows (cascade).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    pub async fn delete(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a password reset token hash, replacing any outstanding one.
    ///
    /// The token itself never touches the database; only its hash does.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn create_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
             VALUES ($1, $2, now() + make_interval(secs => $3))
             ON CONFLICT (user_id)
             DO UPDATE SET token_hash = $2, expires_at = now() + make_interval(secs => $3)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(RESET_TOKEN_TTL_SECONDS)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Redeem a reset token hash: returns the member and deletes the token.
    ///
    /// Expired or unknown tokens return `None`. Single use either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<(UserId, DateTime<Utc>)> = sqlx::query_as(
            "DELETE FROM password_reset_tokens WHERE token_hash = $1
             RETURNING user_id, expires_at",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        let Some((user_id, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at < Utc::now() {
            return Ok(None);
        }

        self.get_by_id(user_id).await
    }
}
