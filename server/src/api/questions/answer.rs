use crate::access::{check_answer, ALREADY_ANSWERED};
use crate::api::ErrorResponse;
use crate::api::extract::Path;
use crate::api::recipes::questions::AnswerResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{Answer, NewAnswer};
use crate::schema::{answers, questions, recipes};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub response: String,
}

#[utoipa::path(
    post,
    path = "/api/questions/{id}/answer",
    tag = "questions",
    params(
        ("id" = Uuid, Path, description = "Question ID")
    ),
    request_body = AnswerRequest,
    responses(
        (status = 201, description = "Answer created", body = AnswerResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Question already answered", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn answer_question(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnswerResponse>), ApiError> {
    let Json(request) = payload?;
    let response = request.response.trim();
    if response.is_empty() {
        return Err(ApiError::invalid("response", "This field may not be blank."));
    }

    let mut conn = pool.get()?;

    let (recipe_author, answer_id): (Uuid, Option<Uuid>) = questions::table
        .inner_join(recipes::table)
        .left_join(answers::table)
        .filter(questions::id.eq(id))
        .select((recipes::user_id, answers::id.nullable()))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    check_answer(recipe_author, user.id, answer_id.is_some())?;

    // The unique index on question_id settles concurrent answers
    let answer = diesel::insert_into(answers::table)
        .values(&NewAnswer {
            question_id: id,
            response,
        })
        .returning(Answer::as_returning())
        .get_result(&mut conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::forbidden(ALREADY_ANSWERED)
            }
            other => ApiError::from(other),
        })?;

    tracing::info!(question_id = %id, user_id = %user.id, "question answered");

    Ok((StatusCode::CREATED, Json(AnswerResponse::from(answer))))
}
