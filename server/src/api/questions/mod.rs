pub mod answer;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/questions endpoints (mounted at /api/questions)
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/answer", post(answer::answer_question))
}

#[derive(OpenApi)]
#[openapi(
    paths(answer::answer_question),
    components(schemas(answer::AnswerRequest))
)]
pub struct ApiDoc;
