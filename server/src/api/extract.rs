//! `Path` and `Query` extractors whose rejections use the JSON error body.

use crate::error::ApiError;
use axum::extract::FromRequestParts;

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PaginationParams;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_bad_query_is_a_json_bad_request() {
        let (mut parts, _) = Request::builder()
            .uri("/api/recipes?limit=lots")
            .body(())
            .unwrap()
            .into_parts();

        let err = Query::<PaginationParams>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_path_outside_router_is_rejected_as_api_error() {
        let (mut parts, _) = Request::builder()
            .uri("/api/recipes/not-a-uuid")
            .body(())
            .unwrap()
            .into_parts();

        // No matched route, so axum has no path params to parse
        let err = Path::<Uuid>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
