pub mod get;
pub mod recipes;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/authors endpoints (mounted at /api/authors)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get::get_author))
        .route("/{id}/recipes", get(recipes::author_recipes))
}

#[derive(OpenApi)]
#[openapi(paths(get::get_author, recipes::author_recipes))]
pub struct ApiDoc;
