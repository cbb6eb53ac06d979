use crate::api::extract::Path;
use crate::api::{AuthorDetails, ErrorResponse};
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Author;
use crate::schema::users;
use axum::{
    extract::State,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/authors/{id}",
    tag = "authors",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Author profile", body = AuthorDetails),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn get_author(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorDetails>, ApiError> {
    let mut conn = pool.get()?;

    let author = users::table
        .find(id)
        .select(Author::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Author"))?;

    Ok(Json(AuthorDetails::from(&author)))
}
