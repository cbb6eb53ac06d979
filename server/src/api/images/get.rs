use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::images::ImagePreset;
use crate::schema::images;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

fn jpeg_response(data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/images/{id}/{preset}",
    tag = "images",
    params(
        ("id" = Uuid, Path, description = "Image ID"),
        ("preset" = ImagePreset, Path, description = "Rendition to serve")
    ),
    responses(
        (status = 200, description = "Image preset data", content_type = "image/jpeg"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(pool): State<Arc<DbPool>>,
    Path((id, preset)): Path<(Uuid, ImagePreset)>,
) -> Result<Response, ApiError> {
    let mut conn = pool.get()?;

    let query = images::table.find(id);
    let data: Option<Vec<u8>> = match preset {
        ImagePreset::Small => query.select(images::small).first(&mut conn).optional()?,
        ImagePreset::Medium => query.select(images::medium).first(&mut conn).optional()?,
    };

    data.map(jpeg_response)
        .ok_or_else(|| ApiError::not_found("Image"))
}
