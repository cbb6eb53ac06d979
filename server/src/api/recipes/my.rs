use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::images::{maybe_image_url, ImagePreset};
use crate::models::{flatten_text, FoodType};
use crate::schema::recipes;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// One of the caller's own recipes, published or not.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyRecipe {
    pub id: Uuid,
    pub food_type: FoodType,
    pub name: String,
    /// URL of the small image preset
    pub image: Option<String>,
    #[schema(value_type = String, example = "4.5")]
    pub stars: Decimal,
    pub tags: Vec<String>,
    pub allow_questions: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyRecipesResponse {
    pub recipes: Vec<MyRecipe>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct MyRecipeRow {
    id: Uuid,
    food_type: FoodType,
    image_id: Option<Uuid>,
    name: String,
    stars: Decimal,
    tags: Vec<Option<String>>,
    allow_questions: bool,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/my",
    tag = "recipes",
    responses(
        (status = 200, description = "The caller's recipes, newest first", body = MyRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_recipes(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
) -> Result<Json<MyRecipesResponse>, ApiError> {
    let mut conn = pool.get()?;

    let rows: Vec<MyRecipeRow> = recipes::table
        .filter(recipes::user_id.eq(user.id))
        .order((recipes::created_at.desc(), recipes::id.asc()))
        .select(MyRecipeRow::as_select())
        .load(&mut conn)?;

    let recipes = rows
        .into_iter()
        .map(|row| MyRecipe {
            id: row.id,
            food_type: row.food_type,
            name: row.name,
            image: maybe_image_url(&config.media_base_url, row.image_id, ImagePreset::Small),
            stars: row.stars,
            tags: flatten_text(row.tags),
            allow_questions: row.allow_questions,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(Json(MyRecipesResponse { recipes }))
}
