pub mod create;
pub mod delete;
pub mod filters;
pub mod form;
pub mod get;
pub mod list;
pub mod my;
pub mod questions;
pub mod ratings;
pub mod similar;
pub mod summary;
pub mod update;

use crate::error::ApiError;
use crate::images::processing::MAX_FILE_SIZE;
use crate::models::{Author, Recipe};
use crate::schema::{recipes, users};
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use diesel::prelude::*;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route("/my", get(my::my_recipes))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::replace_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/{id}/ratings", get(ratings::list_ratings))
        .route(
            "/{id}/ratings/my",
            get(ratings::get_my_rating).post(ratings::rate_recipe),
        )
        .route(
            "/{id}/questions",
            get(questions::list_questions).post(questions::ask_question),
        )
        .route("/{id}/similar", get(similar::similar_recipes))
        // Room for the image plus the text parts of a multipart submission
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
}

/// Load a recipe by id, or report it as not found.
pub fn find_recipe(conn: &mut PgConnection, id: Uuid) -> Result<Recipe, ApiError> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

pub fn find_author(conn: &mut PgConnection, user_id: Uuid) -> Result<Author, ApiError> {
    let author = users::table
        .find(user_id)
        .select(Author::as_select())
        .first(conn)?;
    Ok(author)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        my::my_recipes,
        get::get_recipe,
        update::replace_recipe,
        update::update_recipe,
        delete::delete_recipe,
        ratings::list_ratings,
        ratings::get_my_rating,
        ratings::rate_recipe,
        questions::list_questions,
        questions::ask_question,
        similar::similar_recipes,
    ),
    components(schemas(
        filters::CreatedPreset,
        form::RecipeFields,
        form::RecipeMultipartRequest,
        summary::RecipeSummary,
        summary::RecipeDetail,
        summary::ListRecipesResponse,
        my::MyRecipe,
        my::MyRecipesResponse,
        get::RatingGroup,
        get::RecipeDetailResponse,
        ratings::RatingRequest,
        ratings::RatingResponse,
        ratings::ListRatingsResponse,
        questions::AskQuestionRequest,
        questions::QuestionResponse,
        questions::AnswerResponse,
        questions::ListQuestionsResponse,
        similar::SimilarRecipe,
        similar::SimilarRecipesResponse,
    ))
)]
pub struct ApiDoc;
