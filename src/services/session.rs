//! Session tokens.
//!
//! A session is an HS256 JWT carried in the `triage_session` HttpOnly cookie
//! (or an `Authorization: Bearer` header for non-browser clients). There is no
//! refresh token: the cookie simply expires after the configured TTL.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{SESSION_COOKIE, SessionSettings};
use crate::error::{AppError, AppResult};
use crate::models::user::SessionClaims;

/// JWT issuer claim for session tokens.
pub const SESSION_ISSUER: &str = "triage-board";

/// Create a signed session token for the given user.
pub fn create_session_token(
    user_id: &str,
    username: &str,
    role: &str,
    settings: &SessionSettings,
) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(settings.ttl_secs as i64);

    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        username: username.to_string(),
        role: role.to_string(),
    };

    let key = EncodingKey::from_secret(settings.secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::Internal(format!("Failed to create session token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<SessionClaims, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(token_data.claims)
}

/// Build the session cookie holding `token`.
pub fn session_cookie(token: String, settings: &SessionSettings, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::seconds(settings.ttl_secs as i64));
    cookie
}

/// Build an expired session cookie that clears the browser's copy.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.make_removal();
    cookie
}
