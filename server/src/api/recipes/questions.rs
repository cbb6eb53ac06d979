use super::filters::like_pattern;
use super::find_recipe;
use crate::access::RecipeAccess;
use crate::api::extract::{Path, Query};
use crate::api::{AuthorSummary, ErrorResponse, PaginationMetadata, PaginationParams};
use crate::auth::{AuthUser, MaybeUser};
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{Answer, Author, NewQuestion, Question};
use crate::raw_sql::count_over;
use crate::schema::{answers, questions, users};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const MAX_QUESTION_LEN: usize = 200;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct QuestionSearch {
    /// Case-insensitive substring of the question or its answer
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AskQuestionRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub response: String,
    pub created_at: DateTime<Utc>,
    /// ID of the answered question
    pub question: Uuid,
}

impl From<Answer> for AnswerResponse {
    fn from(answer: Answer) -> Self {
        AnswerResponse {
            response: answer.response,
            created_at: answer.created_at,
            question: answer.question_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: Option<AnswerResponse>,
    pub created_at: DateTime<Utc>,
    pub by: AuthorSummary,
}

impl QuestionResponse {
    fn new(question: Question, by: &Author, answer: Option<Answer>) -> Self {
        QuestionResponse {
            id: question.id,
            question: question.question,
            answer: answer.map(AnswerResponse::from),
            created_at: question.created_at,
            by: by.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListQuestionsResponse {
    pub questions: Vec<QuestionResponse>,
    pub pagination: PaginationMetadata,
}

/// Trimmed question text, or a validation error.
pub fn validate_question(text: &str) -> Result<&str, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::invalid("question", "This field may not be blank."));
    }
    if text.chars().count() > MAX_QUESTION_LEN {
        return Err(ApiError::invalid(
            "question",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_QUESTION_LEN
            ),
        ));
    }
    Ok(text)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/questions",
    tag = "questions",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        QuestionSearch,
        PaginationParams
    ),
    responses(
        (status = 200, description = "Questions, newest first", body = ListQuestionsResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn list_questions(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Query(search): Query<QuestionSearch>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ListQuestionsResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_view(viewer.id())?;

    let mut query = questions::table
        .inner_join(users::table)
        .left_join(answers::table)
        .filter(questions::recipe_id.eq(id))
        .into_boxed();

    let pattern = search
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    if let Some(pattern) = pattern {
        query = query.filter(
            questions::question
                .ilike(pattern.clone())
                .or(answers::response.ilike(pattern)),
        );
    }

    let (limit, offset) = page.resolve();
    let rows: Vec<(Question, Author, Option<Answer>, i64)> = query
        .order((questions::created_at.desc(), questions::id.asc()))
        .select((
            Question::as_select(),
            Author::as_select(),
            Option::<Answer>::as_select(),
            count_over(),
        ))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total = rows.first().map(|(_, _, _, total)| *total).unwrap_or(0);
    let questions = rows
        .into_iter()
        .map(|(question, by, answer, _)| QuestionResponse::new(question, &by, answer))
        .collect();

    Ok(Json(ListQuestionsResponse {
        questions,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/questions",
    tag = "questions",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = AskQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Asking about your own recipe", body = ErrorResponse),
        (status = 404, description = "Recipe not found or not taking questions", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn ask_question(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AskQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let Json(request) = payload?;
    let text = validate_question(&request.question)?;

    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_ask(user.id)?;

    let question = diesel::insert_into(questions::table)
        .values(&NewQuestion {
            recipe_id: id,
            user_id: user.id,
            question: text,
        })
        .returning(Question::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(question_id = %question.id, recipe_id = %id, "question asked");

    Ok((
        StatusCode::CREATED,
        Json(QuestionResponse::new(question, &Author::from(user), None)),
    ))
}
