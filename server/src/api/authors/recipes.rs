use crate::api::extract::{Path, Query};
use crate::api::recipes::filters::Ordering;
use crate::api::recipes::list::{apply_ordering, load_page, published_recipes};
use crate::api::recipes::summary::ListRecipesResponse;
use crate::api::{ErrorResponse, PaginationParams};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::schema::{recipes, users};
use axum::{
    extract::State,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/authors/{id}/recipes",
    tag = "authors",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "The author's published recipes, newest first", body = ListRecipesResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn author_recipes(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ListRecipesResponse>, ApiError> {
    let mut conn = pool.get()?;

    let exists: bool = diesel::select(diesel::dsl::exists(users::table.find(id)))
        .get_result(&mut conn)?;
    if !exists {
        return Err(ApiError::not_found("Author"));
    }

    let query = published_recipes().filter(recipes::user_id.eq(id));
    let query = apply_ordering(query, &[Ordering::DEFAULT]);

    let response = load_page(&mut conn, query, &page, &config.media_base_url)?;
    Ok(Json(response))
}
