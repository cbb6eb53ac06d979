use super::form::{RecipeFields, RecipeForm, RecipeMultipartRequest};
use super::summary::RecipeDetail;
use super::{find_author, find_recipe};
use crate::access::RecipeAccess;
use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::api::images::{delete_image, insert_image, prepare_image};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{Recipe, User};
use crate::schema::recipes;
use axum::{
    extract::State,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body(content(
        (RecipeFields = "application/json"),
        (RecipeMultipartRequest = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
    form: RecipeForm,
) -> Result<Json<RecipeDetail>, ApiError> {
    apply_update(&pool, &config, &user, id, form).map(Json)
}

/// Same partial merge as PATCH. Fields left out of the request keep their
/// current values.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body(content(
        (RecipeFields = "application/json"),
        (RecipeMultipartRequest = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<Uuid>,
    form: RecipeForm,
) -> Result<Json<RecipeDetail>, ApiError> {
    apply_update(&pool, &config, &user, id, form).map(Json)
}

fn apply_update(
    pool: &DbPool,
    config: &Config,
    user: &User,
    id: Uuid,
    form: RecipeForm,
) -> Result<RecipeDetail, ApiError> {
    let mut conn = pool.get()?;

    let existing = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&existing).check_modify(user.id)?;

    let mut changes = form.fields.validate_changes(form.errors)?;
    let image = prepare_image(form.image.as_deref())?;

    let recipe = conn.transaction::<_, ApiError, _>(|conn| {
        if let (Some(processed), Some(original)) = (&image, form.image.as_deref()) {
            changes.image_id = Some(Some(insert_image(conn, user.id, original, processed)?));
        }

        let recipe = diesel::update(recipes::table.find(id))
            .set(&changes)
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        // The replaced image is no longer referenced by anything
        if changes.image_id.is_some() {
            if let Some(old_image) = existing.image_id {
                delete_image(conn, old_image)?;
            }
        }

        Ok(recipe)
    })?;

    tracing::info!(recipe_id = %id, user_id = %user.id, "updated recipe");

    let author = find_author(&mut conn, recipe.user_id)?;
    Ok(RecipeDetail::new(recipe, &author, &config.media_base_url))
}
