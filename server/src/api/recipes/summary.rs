use crate::api::AuthorSummary;
use crate::images::{maybe_image_url, ImagePreset};
use crate::models::{flatten_text, Author, FoodType, Recipe};
use crate::schema::recipes;
use crate::text::{truncate_words, SHORT_DESCRIPTION_WORDS};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// The columns needed for list views. Ingredients and steps are never loaded.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SummaryRow {
    pub id: Uuid,
    pub food_type: FoodType,
    pub image_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub stars: Decimal,
    pub servings: i16,
    pub cooking_time: i16,
    pub tags: Vec<Option<String>>,
    pub allow_questions: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe as shown in listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub food_type: FoodType,
    pub name: String,
    /// First 20 words of the description
    pub short_description: String,
    /// URL of the small image preset
    pub image: Option<String>,
    /// Average rating, one decimal place
    #[schema(value_type = String, example = "4.5")]
    pub stars: Decimal,
    pub servings: i16,
    pub cooking_time: i16,
    pub tags: Vec<String>,
    pub allow_questions: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeSummary {
    pub fn new(row: SummaryRow, author: &Author, media_base_url: &str) -> Self {
        RecipeSummary {
            id: row.id,
            author: author.into(),
            food_type: row.food_type,
            name: row.name,
            short_description: truncate_words(&row.description, SHORT_DESCRIPTION_WORDS),
            image: maybe_image_url(media_base_url, row.image_id, ImagePreset::Small),
            stars: row.stars,
            servings: row.servings,
            cooking_time: row.cooking_time,
            tags: flatten_text(row.tags),
            allow_questions: row.allow_questions,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub pagination: crate::api::PaginationMetadata,
}

/// Full recipe, returned by the detail, create and update endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub food_type: FoodType,
    pub name: String,
    pub description: String,
    /// URL of the medium image preset
    pub image: Option<String>,
    #[schema(value_type = String, example = "4.5")]
    pub stars: Decimal,
    pub servings: i16,
    pub cooking_time: i16,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub allow_questions: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, author: &Author, media_base_url: &str) -> Self {
        RecipeDetail {
            id: recipe.id,
            author: author.into(),
            food_type: recipe.food_type,
            name: recipe.name,
            description: recipe.description,
            image: maybe_image_url(media_base_url, recipe.image_id, ImagePreset::Medium),
            stars: recipe.stars,
            servings: recipe.servings,
            cooking_time: recipe.cooking_time,
            ingredients: flatten_text(recipe.ingredients),
            steps: flatten_text(recipe.steps),
            tags: flatten_text(recipe.tags),
            allow_questions: recipe.allow_questions,
            published: recipe.published,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}
