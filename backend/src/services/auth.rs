//! Authentication service for login, token issuance, and user management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use shared::types::Role;
use shared::validation::{validate_password, validate_username};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

/// User profile returned to clients
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    pub location_id: Option<Uuid>,
    pub location_name: Option<String>,
    pub alert_threshold: i32,
}

/// Input for creating a user (master only)
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub location_id: Option<Uuid>,
    pub alert_threshold: Option<i32>,
}

/// User row from the database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    location_id: Option<Uuid>,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate with username and password.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, location_id, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(&input.username)
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

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let access_token = self.generate_token(&user)?;
        let info = self.get_user(user.id).await?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user: info,
        })
    }

    /// Get a user's profile.
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<UserInfo> {
        sqlx::query_as::<_, UserInfo>(
            r#"
            SELECT u.id, u.username, u.display_name, u.role,
                   u.location_id, l.name AS location_name, u.alert_threshold
            FROM users u
            LEFT JOIN locations l ON l.id = u.location_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Update the caller's low-stock alert threshold.
    pub async fn update_alert_threshold(
        &self,
        user_id: Uuid,
        threshold: i32,
    ) -> AppResult<UserInfo> {
        if threshold < 0 {
            return Err(AppError::Validation {
                field: "alert_threshold".to_string(),
                message: "Alert threshold cannot be negative".to_string(),
            });
        }

        let result = sqlx::query("UPDATE users SET alert_threshold = $1 WHERE id = $2")
            .bind(threshold)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        self.get_user(user_id).await
    }

    /// Create a user. General users must be assigned to a location.
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<UserInfo> {
        if let Err(msg) = validate_username(&input.username) {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: msg.to_string(),
            });
        }
        if let Err(msg) = validate_password(&input.password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
            });
        }
        if input.role == Role::General && input.location_id.is_none() {
            return Err(AppError::Validation {
                field: "location_id".to_string(),
                message: "General users must be assigned to a location".to_string(),
            });
        }

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(&input.username)
        .fetch_one(&self.db)
        .await?;
        if taken {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        if let Some(location_id) = input.location_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)",
            )
            .bind(location_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Location".to_string()));
            }
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, password_hash, display_name, role, location_id, alert_threshold)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&password_hash)
        .bind(&input.display_name)
        .bind(input.role.as_str())
        .bind(input.location_id)
        .bind(input.alert_threshold.unwrap_or(10))
        .fetch_one(&self.db)
        .await?;

        self.get_user(id).await
    }

    fn generate_token(&self, user: &UserRow) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            location_id: user.location_id.map(|id| id.to_string()),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
