//! Authentication service for organization registration, login, and token
//! management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::models::Role;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new organization with its admin account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 120))]
    pub organization_name: String,
    /// ISO 4217 base currency, e.g. "USD" or "KES"
    pub currency_code: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Input for login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub organization_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    organization_id: Uuid,
    role: String,
    password_hash: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new organization with its admin account
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisterResponse> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        if let Some(code) = input.currency_code.as_deref() {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(AppError::Validation {
                    field: "currency_code".to_string(),
                    message: "Currency code must be a 3-letter ISO code".to_string(),
                });
            }
        }

        let email = input.email.trim().to_lowercase();
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        // Organization and admin user commit together
        let mut tx = self.db.begin().await?;

        let organization_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO organizations (name, currency_code)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(input.organization_name.trim())
        .bind(input.currency_code.as_deref().map(str::to_uppercase))
        .fetch_one(&mut *tx)
        .await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (organization_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, 'admin')
            RETURNING id
            "#,
        )
        .bind(organization_id)
        .bind(input.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE organizations SET created_by = $1 WHERE id = $2")
            .bind(user_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let tokens = self.issue_tokens(user_id, organization_id, Role::Admin)?;

        Ok(RegisterResponse {
            organization_id,
            user_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        })
    }

    /// Verify credentials and issue tokens
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let email = input.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, organization_id, role, password_hash, is_active \
             FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = Role::from_str(&user.role).ok_or_else(|| {
            AppError::Internal(format!("Unknown role '{}' on user {}", user.role, user.id))
        })?;

        self.issue_tokens(user.id, user.organization_id, role)
    }

    /// Exchange a refresh token for a fresh pair
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = decode::<Claims>(
            &input.refresh_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?
        .claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        // Re-read the user so revoked accounts and role changes take effect
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, organization_id, role, password_hash, is_active \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::InvalidToken);
        }

        let role = Role::from_str(&user.role).ok_or(AppError::InvalidToken)?;
        self.issue_tokens(user.id, user.organization_id, role)
    }

    fn issue_tokens(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        role: Role,
    ) -> AppResult<AuthTokens> {
        let access_token = self.encode_token(user_id, organization_id, role, self.access_token_expiry)?;
        let refresh_token =
            self.encode_token(user_id, organization_id, role, self.refresh_token_expiry)?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn encode_token(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        role: Role,
        expiry_seconds: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            organization_id: organization_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }
}
