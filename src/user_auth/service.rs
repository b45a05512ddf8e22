use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use super::keys::TokenIssuer;
use crate::account::models::User;
use crate::auth::AuthError;
use crate::error::PaymentError;

/// User Registration Request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 64))]
    pub user_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub password: String,
}

/// User Login Request: exactly one of `userName` / `email`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response (bearer token)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub token: String,
    pub user_id: i64,
    pub user_name: String,
}

/// Public view of a newly registered user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: i64,
    pub user_name: String,
    pub email: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.username,
            email: user.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    password_hash: String,
}

enum LoginIdentifier<'a> {
    Username(&'a str),
    Email(&'a str),
}

impl LoginRequest {
    fn identifier(&self) -> Result<LoginIdentifier<'_>, PaymentError> {
        let user_name = self.user_name.as_deref().filter(|s| !s.is_empty());
        let email = self.email.as_deref().filter(|s| !s.is_empty());
        match (user_name, email) {
            (Some(name), None) => Ok(LoginIdentifier::Username(name)),
            (None, Some(email)) => Ok(LoginIdentifier::Email(email)),
            _ => Err(PaymentError::Validation(
                "exactly one of userName or email is required".to_string(),
            )),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, PaymentError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PaymentError::Internal(format!("password hashing failed: {e}")))
}

/// `Ok(false)` on mismatch; `Err` only for an unparseable stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PaymentError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| PaymentError::Internal(format!("invalid stored password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn duplicate_user_error(err: &sqlx::Error, req: &RegisterRequest) -> Option<PaymentError> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    let message = match db_err.constraint() {
        Some(c) if c.contains("email") => format!("user with email already exists: {}", req.email),
        _ => format!("user with username already exists: {}", req.user_name),
    };
    Some(PaymentError::Validation(message))
}

pub struct UserAuthService {
    db: PgPool,
    issuer: TokenIssuer,
}

impl UserAuthService {
    pub fn new(db: PgPool, issuer: TokenIssuer) -> Self {
        Self { db, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<User, PaymentError> {
        let password_hash = hash_password(&req.password)?;

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, first_name, last_name, created_at
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.user_name)
        .bind(&req.email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "User registered");
                Ok(user)
            }
            Err(e) => match duplicate_user_error(&e, &req) {
                Some(dup) => {
                    tracing::warn!(username = %req.user_name, "Registration attempt for existing user");
                    Err(dup)
                }
                None => Err(PaymentError::Database(e)),
            },
        }
    }

    /// Login user and issue a token
    pub async fn login(&self, req: LoginRequest) -> Result<LoginData, PaymentError> {
        let query = match req.identifier()? {
            LoginIdentifier::Username(name) => sqlx::query_as::<_, CredentialRow>(
                "SELECT id, username, password_hash FROM users WHERE username = $1",
            )
            .bind(name),
            LoginIdentifier::Email(email) => sqlx::query_as::<_, CredentialRow>(
                "SELECT id, username, password_hash FROM users WHERE email = $1",
            )
            .bind(email),
        };

        let row = query
            .fetch_optional(&self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&req.password, &row.password_hash)? {
            tracing::debug!(user_id = row.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self
            .issuer
            .issue(row.id)
            .map_err(|e| PaymentError::Internal(format!("{e:#}")))?;

        Ok(LoginData {
            token,
            user_id: row.id,
            user_name: row.username,
        })
    }
}
