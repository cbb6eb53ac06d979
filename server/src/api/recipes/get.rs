use super::summary::RecipeDetail;
use super::{find_author, find_recipe};
use crate::access::RecipeAccess;
use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::stars::rating_groups;
use axum::{
    extract::State,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of ratings with a given star value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RatingGroup {
    pub stars: i16,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub recipe: RecipeDetail,
    /// Ratings per observed star value, ascending
    pub rating_groups: Vec<RatingGroup>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_view(viewer.id())?;

    let author = find_author(&mut conn, recipe.user_id)?;
    let rating_groups = rating_groups(&mut conn, recipe.id)?
        .into_iter()
        .map(|(stars, count)| RatingGroup { stars, count })
        .collect();

    Ok(Json(RecipeDetailResponse {
        recipe: RecipeDetail::new(recipe, &author, &config.media_base_url),
        rating_groups,
    }))
}
