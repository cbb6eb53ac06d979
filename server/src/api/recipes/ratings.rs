use super::find_recipe;
use crate::access::RecipeAccess;
use crate::api::extract::{Path, Query};
use crate::api::{AuthorSummary, ErrorResponse, PaginationMetadata, PaginationParams};
use crate::auth::{AuthUser, MaybeUser};
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::models::{Author, NewRating, Rating};
use crate::raw_sql::count_over;
use crate::schema::{ratings, users};
use crate::stars::{recompute_recipe_stars, MAX_STARS, MIN_STARS};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::pg::upsert::excluded;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::query_dsl::LoadQuery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_BODY_LEN: usize = 200;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RatingRequest {
    /// 1 to 5
    pub stars: i16,
    pub body: String,
}

impl RatingRequest {
    /// Trimmed body and stars, or every field error at once.
    pub fn validate(&self) -> Result<(i16, &str), ApiError> {
        let mut errors = FieldErrors::new();

        if !(MIN_STARS..=MAX_STARS).contains(&self.stars) {
            errors.add(
                "stars",
                format!(
                    "Ensure this value is between {} and {}.",
                    MIN_STARS, MAX_STARS
                ),
            );
        }

        let body = self.body.trim();
        if body.is_empty() {
            errors.add("body", "This field may not be blank.");
        } else if body.chars().count() > MAX_BODY_LEN {
            errors.add(
                "body",
                format!(
                    "Ensure this field has no more than {} characters.",
                    MAX_BODY_LEN
                ),
            );
        }

        errors.into_result()?;
        Ok((self.stars, body))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingResponse {
    pub id: Uuid,
    pub by: AuthorSummary,
    pub stars: i16,
    pub body: String,
    /// Set once the rating has been changed after its first submission
    pub edited: bool,
    pub updated_at: DateTime<Utc>,
}

impl RatingResponse {
    fn new(rating: Rating, by: &Author) -> Self {
        RatingResponse {
            id: rating.id,
            by: by.into(),
            stars: rating.stars,
            body: rating.body,
            edited: rating.edited,
            updated_at: rating.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRatingsResponse {
    pub ratings: Vec<RatingResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/ratings",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Ratings, most recently updated first", body = ListRatingsResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn list_ratings(
    viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ListRatingsResponse>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    RecipeAccess::from(&recipe).check_view(viewer.id())?;

    let (limit, offset) = page.resolve();
    let rows: Vec<(Rating, Author, i64)> = ratings::table
        .inner_join(users::table)
        .filter(ratings::recipe_id.eq(id))
        .order((ratings::updated_at.desc(), ratings::id.asc()))
        .select((Rating::as_select(), Author::as_select(), count_over()))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    let total = rows.first().map(|(_, _, total)| *total).unwrap_or(0);
    let ratings = rows
        .into_iter()
        .map(|(rating, by, _)| RatingResponse::new(rating, &by))
        .collect();

    Ok(Json(ListRatingsResponse {
        ratings,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/ratings/my",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "The caller's rating, or null", body = Option<RatingResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_rating(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<RatingResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;

    let rating = ratings::table
        .inner_join(users::table)
        .filter(ratings::recipe_id.eq(id))
        .filter(ratings::user_id.eq(user.id))
        .select((Rating::as_select(), Author::as_select()))
        .first::<(Rating, Author)>(&mut conn)
        .optional()?;

    RecipeAccess::from(&recipe).check_own_rating(user.id, rating.is_some())?;

    Ok(Json(rating.map(|(rating, by)| RatingResponse::new(rating, &by))))
}

/// Insert a rating, or overwrite the caller's existing one and mark it edited.
fn upsert_rating<'a>(
    rating: NewRating<'a>,
    now: DateTime<Utc>,
) -> impl LoadQuery<'a, PgConnection, Rating> + QueryFragment<Pg> + 'a {
    diesel::insert_into(ratings::table)
        .values(rating)
        .on_conflict((ratings::user_id, ratings::recipe_id))
        .do_update()
        .set((
            ratings::stars.eq(excluded(ratings::stars)),
            ratings::body.eq(excluded(ratings::body)),
            ratings::edited.eq(true),
            ratings::updated_at.eq(now),
        ))
        .returning(Rating::as_returning())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/ratings/my",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating created or updated", body = RatingResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rate_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<RatingResponse>, ApiError> {
    let Json(request) = payload?;
    let (stars, body) = request.validate()?;

    let mut conn = pool.get()?;
    let recipe = find_recipe(&mut conn, id)?;

    let rating = conn.transaction::<_, ApiError, _>(|conn| {
        let already_rated: bool = diesel::select(diesel::dsl::exists(
            ratings::table
                .filter(ratings::recipe_id.eq(id))
                .filter(ratings::user_id.eq(user.id)),
        ))
        .get_result(conn)?;

        // Existing ratings stay editable after the recipe is unpublished
        if !already_rated {
            RecipeAccess::from(&recipe).check_rate()?;
        }

        let new_rating = NewRating {
            recipe_id: id,
            user_id: user.id,
            stars,
            body,
        };
        let rating: Rating = upsert_rating(new_rating, Utc::now()).get_result(&mut **conn)?;

        recompute_recipe_stars(conn, id)?;
        Ok(rating)
    })?;

    tracing::info!(
        recipe_id = %id,
        user_id = %user.id,
        stars = rating.stars,
        edited = rating.edited,
        "saved rating"
    );

    Ok(Json(RatingResponse::new(rating, &Author::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(stars: i16, body: &str) -> RatingRequest {
        RatingRequest {
            stars,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_valid_rating() {
        let req = request(4, "  Lovely and easy  ");
        assert_eq!(req.validate().unwrap(), (4, "Lovely and easy"));
    }

    #[test]
    fn test_stars_out_of_range() {
        for stars in [0, 6, -1] {
            match request(stars, "ok").validate() {
                Err(ApiError::Validation(fields)) => assert!(fields.get("stars").is_some()),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_all_field_errors_reported_together() {
        match request(9, "   ").validate() {
            Err(ApiError::Validation(fields)) => {
                assert!(fields.get("stars").is_some());
                assert!(fields.get("body").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_body_length_limit() {
        let long = "x".repeat(MAX_BODY_LEN + 1);
        assert!(request(3, &long).validate().is_err());
        let max = "x".repeat(MAX_BODY_LEN);
        assert!(request(3, &max).validate().is_ok());
    }

    #[test]
    fn test_upsert_overwrites_on_user_and_recipe_conflict() {
        let rating = NewRating {
            recipe_id: Uuid::from_u128(7),
            user_id: Uuid::from_u128(9),
            stars: 4,
            body: "Lovely",
        };
        let sql = diesel::debug_query::<Pg, _>(&upsert_rating(rating, Utc::now())).to_string();

        assert!(sql.starts_with(r#"INSERT INTO "ratings""#), "{}", sql);
        assert!(
            sql.contains(r#"ON CONFLICT ("user_id", "recipe_id") DO UPDATE SET"#),
            "{}",
            sql
        );
        assert!(sql.contains(r#""stars" = excluded."stars""#), "{}", sql);
        assert!(sql.contains(r#""body" = excluded."body""#), "{}", sql);
        assert!(sql.contains(r#""edited" = $"#), "{}", sql);
        assert!(sql.contains("RETURNING"), "{}", sql);
        assert!(sql.contains("true"), "{}", sql);
    }
}
