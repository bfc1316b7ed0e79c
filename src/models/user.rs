//! User models and the request-scoped caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is making the request. Passed explicitly into every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// `None` for the bootstrap admin key
    pub user_id: Option<Uuid>,
    pub username: String,
    pub role: Role,
}

impl Caller {
    /// Caller authenticated with the bootstrap admin key.
    pub fn bootstrap_admin() -> Self {
        Self {
            user_id: None,
            username: "admin-key".to_string(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Fail with `Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// User info response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

/// Registration payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewUser> {
        let username = self.username.map(|s| s.trim().to_string()).unwrap_or_default();
        let email = self.email.map(|s| s.trim().to_string()).unwrap_or_default();
        let password = self.password.unwrap_or_default();

        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username, email, and password required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("email is not a valid address".to_string()));
        }

        Ok(NewUser {
            username,
            email,
            password,
        })
    }
}

/// Login payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Admin update of a user's role and active flag.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub username: String,
    pub role: String,
}
