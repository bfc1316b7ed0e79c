//! Actix-web extractors that resolve the request-scoped caller.
//!
//! A request is authenticated by, in order:
//! 1. the `X-Admin-Key` header matching the bootstrap key (admin caller), or
//! 2. a session JWT from the `triage_session` cookie or an
//!    `Authorization: Bearer` header, whose user must still exist and be active.
//!
//! # Security
//! - Header secrets are wrapped in `SecretString` as soon as they are read
//! - Tokens and keys are never logged

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use uuid::Uuid;

use super::AdminKey;
use crate::config::{ADMIN_KEY_HEADER, Config, SESSION_COOKIE};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Caller, Role};
use crate::services::session::verify_session_token;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Session token from the cookie, falling back to a bearer header.
fn session_token(req: &HttpRequest) -> Option<SecretString> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(SecretString::from(cookie.value().to_string()));
        }
    }
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| SecretString::from(t.trim().to_string()))
}

/// Everything the resolver needs, cloned out of the request.
struct AuthContext {
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    admin_key: Option<web::Data<AdminKey>>,
    provided_admin_key: Option<SecretString>,
    token: Option<SecretString>,
}

impl AuthContext {
    fn from_request(req: &HttpRequest) -> AppResult<Self> {
        let pool = req
            .app_data::<web::Data<DbPool>>()
            .cloned()
            .ok_or_else(|| AppError::Database("Database pool not configured".to_string()))?;
        let config = req
            .app_data::<web::Data<Config>>()
            .cloned()
            .ok_or_else(|| AppError::Database("Configuration not available".to_string()))?;

        Ok(Self {
            pool,
            config,
            admin_key: req.app_data::<web::Data<AdminKey>>().cloned(),
            provided_admin_key: extract_secret_header(req, ADMIN_KEY_HEADER),
            token: session_token(req),
        })
    }

    /// `Ok(None)` when the request carries no credentials at all.
    async fn resolve(self) -> AppResult<Option<Caller>> {
        if let Some(provided) = &self.provided_admin_key {
            let valid = self
                .admin_key
                .as_ref()
                .is_some_and(|key| key.verify(provided.expose_secret()));
            if valid {
                return Ok(Some(Caller::bootstrap_admin()));
            }
            warn!("Rejected request with invalid admin key");
            return Err(AppError::Unauthorized("Invalid admin key".to_string()));
        }

        let Some(token) = self.token else {
            return Ok(None);
        };

        let claims = verify_session_token(token.expose_secret(), &self.config.session.secret)
            .map_err(|e| {
                debug!("Session rejected: {}", e);
                AppError::Unauthorized("Invalid or expired session".to_string())
            })?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
        let user = self
            .pool
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
        if !user.is_active {
            warn!("Session for disabled user {}", user.username);
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        Ok(Some(Caller {
            user_id: Some(user.id),
            role: Role::parse(&user.role).unwrap_or_default(),
            username: user.username,
        }))
    }
}

/// Extractor that requires an authenticated caller.
///
/// ```ignore
/// async fn protected_handler(auth: CurrentUser) -> impl Responder {
///     // auth.caller.role, auth.caller.username
/// }
/// ```
pub struct CurrentUser {
    pub caller: Caller,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = AuthContext::from_request(req);
        Box::pin(async move {
            match ctx?.resolve().await? {
                Some(caller) => Ok(CurrentUser { caller }),
                None => Err(AppError::Unauthorized("Authentication required".to_string())),
            }
        })
    }
}

/// Extractor for endpoints that are public but may use the caller if present.
///
/// Invalid credentials degrade to an anonymous caller.
pub struct MaybeUser {
    pub caller: Option<Caller>,
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = AuthContext::from_request(req);
        Box::pin(async move {
            match ctx?.resolve().await {
                Ok(caller) => Ok(MaybeUser { caller }),
                Err(AppError::Unauthorized(reason)) => {
                    debug!("Treating request as anonymous: {}", reason);
                    Ok(MaybeUser { caller: None })
                }
                Err(e) => Err(e),
            }
        })
    }
}
