use super::find_recipe;
use crate::access::RecipeAccess;
use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::images::{maybe_image_url, ImagePreset};
use crate::models::flatten_text;
use crate::similarity::{find_similar, Ranked};
use axum::{
    extract::State,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimilarRecipe {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "4.5")]
    pub stars: Decimal,
    /// URL of the small image preset
    pub image: Option<String>,
}

impl SimilarRecipe {
    fn new(ranked: Ranked, media_base_url: &str) -> Self {
        let candidate = ranked.candidate;
        SimilarRecipe {
            id: candidate.id,
            name: candidate.name,
            stars: candidate.stars,
            image: maybe_image_url(media_base_url, candidate.image_id, ImagePreset::Small),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimilarRecipesResponse {
    pub recipes: Vec<SimilarRecipe>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/similar",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Up to 4 recipes sharing tags, best match first", body = SimilarRecipesResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn similar_recipes(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SimilarRecipesResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_view(viewer.id())?;

    let tags = flatten_text(recipe.tags);
    let recipes = find_similar(&mut conn, recipe.id, &tags)?
        .into_iter()
        .map(|ranked| SimilarRecipe::new(ranked, &config.media_base_url))
        .collect();

    Ok(Json(SimilarRecipesResponse { recipes }))
}
