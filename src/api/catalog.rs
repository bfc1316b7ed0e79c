//! Lookup endpoints for filing and filtering issues.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::TagResponse;
use crate::services::catalog::{BUILD_OPTIONS, platform_display, targets_for_release};

/// A platform code with its display name.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformResponse {
    pub code: String,
    pub display: String,
}

/// List every tag.
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Catalog",
    responses((status = 200, description = "All tags", body = Vec<TagResponse>))
)]
pub async fn list_tags(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_tags().await?))
}

/// List releases present on issues.
#[utoipa::path(
    get,
    path = "/api/v1/releases",
    tag = "Catalog",
    responses((status = 200, description = "Distinct releases", body = Vec<String>))
)]
pub async fn list_releases(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.distinct_releases().await?))
}

/// List platforms present on issues.
#[utoipa::path(
    get,
    path = "/api/v1/platforms",
    tag = "Catalog",
    responses((status = 200, description = "Distinct platforms", body = Vec<PlatformResponse>))
)]
pub async fn list_platforms(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let platforms: Vec<PlatformResponse> = pool
        .distinct_platforms()
        .await?
        .into_iter()
        .map(|code| PlatformResponse {
            display: platform_display(&code).to_string(),
            code,
        })
        .collect();
    Ok(HttpResponse::Ok().json(platforms))
}

/// Build cadence options.
#[utoipa::path(
    get,
    path = "/api/v1/builds",
    tag = "Catalog",
    responses((status = 200, description = "Build options", body = Vec<String>))
)]
pub async fn list_builds() -> HttpResponse {
    HttpResponse::Ok().json(BUILD_OPTIONS)
}

/// Targets known for a release; unknown releases have none.
#[utoipa::path(
    get,
    path = "/api/v1/targets/{release}",
    tag = "Catalog",
    params(("release" = String, Path, description = "Release number, e.g. 251")),
    responses((status = 200, description = "Targets", body = Vec<String>))
)]
pub async fn list_targets(path: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(targets_for_release(&path.into_inner()))
}

/// Configure catalog routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/tags").route(web::get().to(list_tags)))
        .service(web::resource("/releases").route(web::get().to(list_releases)))
        .service(web::resource("/platforms").route(web::get().to(list_platforms)))
        .service(web::resource("/builds").route(web::get().to(list_builds)))
        .service(web::resource("/targets/{release}").route(web::get().to(list_targets)));
}
