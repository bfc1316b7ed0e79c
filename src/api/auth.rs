//! Registration, login and session endpoints.
//!
//! A successful login sets the `triage_session` cookie; the same token is
//! also returned in the body for non-browser clients.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::{CurrentUser, MaybeUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::models::{MessageResponse, UserResponse};
use crate::services::session::{clear_session_cookie, create_session_token, session_cookie};

/// Login result.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    /// Session token, also set as the `triage_session` cookie
    pub token: String,
}

/// Current caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub username: String,
    pub role: String,
    /// Absent for the bootstrap admin key
    pub user: Option<UserResponse>,
}

/// Register a user account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorResponse),
    )
)]
pub async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let new_user = body.into_inner().validate()?;
    let user = pool.register_user(new_user).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Log in with username and password.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials or disabled account", body = crate::error::ErrorResponse),
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(AppError::Validation(
            "Username and password required".to_string(),
        ));
    };

    let user = pool.authenticate(username.trim(), &password).await?;
    let token = create_session_token(
        &user.id.to_string(),
        &user.username,
        &user.role,
        &config.session,
    )?;
    let cookie = session_cookie(token.clone(), &config.session, !config.is_development());

    info!("User {} logged in", user.username);
    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        user: UserResponse::from(user),
        token,
    }))
}

/// Log out by clearing the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(auth: MaybeUser, config: web::Data<Config>) -> HttpResponse {
    if let Some(caller) = auth.caller {
        info!("User {} logged out", caller.username);
    }
    HttpResponse::Ok()
        .cookie(clear_session_cookie(!config.is_development()))
        .json(MessageResponse::new("Logged out"))
}

/// The authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current caller", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn me(auth: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let user = match auth.caller.user_id {
        Some(id) => pool.find_user(id).await?.map(UserResponse::from),
        None => None,
    };
    Ok(HttpResponse::Ok().json(MeResponse {
        username: auth.caller.username,
        role: auth.caller.role.to_string(),
        user,
    }))
}

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/register").route(web::post().to(register)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/logout").route(web::post().to(logout)))
        .service(web::resource("/auth/me").route(web::get().to(me)));
}
