use super::find_recipe;
use crate::access::RecipeAccess;
use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::api::images::delete_image;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::schema::recipes;
use axum::{
    extract::State,
    http::StatusCode,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_modify(user.id)?;

    conn.transaction::<_, ApiError, _>(|conn| {
        // Ratings, questions and answers go with the recipe via ON DELETE CASCADE
        diesel::delete(recipes::table.find(id)).execute(conn)?;
        if let Some(image_id) = recipe.image_id {
            delete_image(conn, image_id)?;
        }
        Ok(())
    })?;

    tracing::info!(recipe_id = %id, user_id = %user.id, "deleted recipe");

    Ok(StatusCode::NO_CONTENT)
}
