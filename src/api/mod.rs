//! API endpoint modules.
//!
//! Handlers resolve the caller, validate the wire payload and delegate to the
//! repository operations on [`crate::db::DbPool`].

pub mod admin;
pub mod attachments;
pub mod auth;
mod body;
pub mod catalog;
pub mod comments;
pub mod health;
pub mod issues;
pub mod openapi;
pub mod search;

use actix_web::web;

use crate::error::AppError;

pub use openapi::ApiDoc;

/// Register every route. Mounted under `/api/v1`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .configure(auth::configure_routes)
        .configure(issues::configure_routes)
        .configure(comments::configure_routes)
        .configure(search::configure_routes)
        .configure(attachments::configure_routes)
        .configure(catalog::configure_routes)
        .configure(admin::configure_routes);
}

/// JSON extractor config: malformed bodies become validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid JSON body: {}", err)).into()
    })
}

/// Query extractor config: malformed query strings become validation errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err)).into()
    })
}

/// Path extractor config: malformed ids become validation errors.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid path parameter: {}", err)).into()
    })
}
