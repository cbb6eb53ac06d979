pub mod get;

use crate::error::ApiError;
use crate::images::processing::{process_image, ProcessedImage};
use crate::models::NewImage;
use crate::schema::images;
use crate::AppState;
use axum::routing::get;
use axum::Router;
use diesel::prelude::*;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for /api/images endpoints (mounted at /api/images)
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/{preset}", get(get::get_image))
}

/// Decode and render an uploaded image. Failures are reported against the
/// `image` field.
pub fn prepare_image(data: Option<&[u8]>) -> Result<Option<ProcessedImage>, ApiError> {
    data.map(|bytes| process_image(bytes).map_err(|e| ApiError::invalid("image", e.to_string())))
        .transpose()
}

/// Store the original upload and its presets, returning the new image id.
pub fn insert_image(
    conn: &mut PgConnection,
    user_id: Uuid,
    original: &[u8],
    processed: &ProcessedImage,
) -> Result<Uuid, ApiError> {
    let id = diesel::insert_into(images::table)
        .values(&NewImage {
            user_id,
            content_type: &processed.content_type,
            data: original,
            small: &processed.small,
            medium: &processed.medium,
        })
        .returning(images::id)
        .get_result(conn)?;

    tracing::debug!(image_id = %id, bytes = original.len(), "stored image");
    Ok(id)
}

pub fn delete_image(conn: &mut PgConnection, id: Uuid) -> Result<(), ApiError> {
    diesel::delete(images::table.find(id)).execute(conn)?;
    Ok(())
}

#[derive(OpenApi)]
#[openapi(paths(get::get_image))]
pub struct ApiDoc;
