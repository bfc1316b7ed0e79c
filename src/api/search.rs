//! Search API handlers.
//!
//! Free text matches title, description or test case id case-insensitively;
//! structured filters are exact and combined with AND. Results are newest
//! first and capped at `size`. There is no relevance ranking.

use actix_web::{HttpResponse, web};

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{SearchQuery, SearchRequest, SearchResponse};

/// Search issues via query string.
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "Search",
    params(
        ("q" = Option<String>, Query, description = "Free text"),
        ("size" = Option<u64>, Query, description = "Result cap (default 20, max 500)"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("severity" = Option<String>, Query, description = "Exact severity"),
        ("release" = Option<String>, Query, description = "Exact release"),
        ("platform" = Option<String>, Query, description = "Exact platform code"),
        ("build" = Option<String>, Query, description = "Exact build cadence"),
        ("target" = Option<String>, Query, description = "Exact target"),
        ("test_case_ids" = Option<String>, Query, description = "Exact test case identifier"),
        ("reporter_name" = Option<String>, Query, description = "Exact reporter"),
        ("tags" = Option<String>, Query, description = "Comma-separated tags (accepted, not applied)"),
    ),
    responses(
        (status = 200, description = "Matching issues", body = SearchResponse),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
    )
)]
pub async fn search_get(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let spec = query.into_inner().into_spec(config.query.default_search_size);
    Ok(HttpResponse::Ok().json(pool.search_issues(&spec).await?))
}

/// Search issues with a JSON body.
#[utoipa::path(
    post,
    path = "/api/v1/search",
    tag = "Search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching issues", body = SearchResponse),
        (status = 400, description = "Invalid body", body = crate::error::ErrorResponse),
    )
)]
pub async fn search_post(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<SearchRequest>,
) -> AppResult<HttpResponse> {
    let spec = body.into_inner().into_spec(config.query.default_search_size);
    Ok(HttpResponse::Ok().json(pool.search_issues(&spec).await?))
}

/// Configure search routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/search")
            .route(web::get().to(search_get))
            .route(web::post().to(search_post)),
    );
}
