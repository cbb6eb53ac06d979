use super::form::{RecipeFields, RecipeForm, RecipeMultipartRequest};
use super::summary::RecipeDetail;
use crate::api::images::{insert_image, prepare_image};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{to_text_array, Author, NewRecipe, Recipe};
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body(content(
        (RecipeFields = "application/json"),
        (RecipeMultipartRequest = "multipart/form-data")
    )),
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    form: RecipeForm,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let input = form.fields.validate_new(form.errors)?;
    let image = prepare_image(form.image.as_deref())?;

    let ingredients = to_text_array(&input.ingredients);
    let steps = to_text_array(&input.steps);
    let tags = to_text_array(&input.tags);

    let mut conn = pool.get()?;

    let recipe = conn.transaction::<_, ApiError, _>(|conn| {
        let image_id = match (&image, form.image.as_deref()) {
            (Some(processed), Some(original)) => {
                Some(insert_image(conn, user.id, original, processed)?)
            }
            _ => None,
        };

        let recipe = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                user_id: user.id,
                food_type: input.food_type,
                image_id,
                name: &input.name,
                description: &input.description,
                servings: input.servings,
                cooking_time: input.cooking_time,
                ingredients: &ingredients,
                steps: &steps,
                tags: &tags,
                allow_questions: input.allow_questions,
                published: input.published,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        Ok(recipe)
    })?;

    tracing::info!(recipe_id = %recipe.id, user_id = %user.id, "created recipe");

    let author = Author::from(user);
    Ok((
        StatusCode::CREATED,
        Json(RecipeDetail::new(recipe, &author, &config.media_base_url)),
    ))
}
