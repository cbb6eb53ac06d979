use super::filters::{Ordering, RecipeFilters, SortField};
use super::summary::{ListRecipesResponse, RecipeSummary, SummaryRow};
use crate::api::extract::Query;
use crate::api::{ErrorResponse, PaginationMetadata, PaginationParams};
use crate::auth::MaybeUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Author;
use crate::raw_sql::count_over;
use crate::schema::{recipes, users};
use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use diesel::dsl::{InnerJoin, IntoBoxed};
use diesel::pg::Pg;
use diesel::prelude::*;
use std::sync::Arc;

/// Published recipes joined with their authors, ready for further filters.
pub type SummaryQuery<'a> = IntoBoxed<'a, InnerJoin<recipes::table, users::table>, Pg>;

pub fn published_recipes<'a>() -> SummaryQuery<'a> {
    recipes::table
        .inner_join(users::table)
        .into_boxed()
        .filter(recipes::published.eq(true))
}

/// Narrow a listing query by every filter that is set.
pub fn apply_filters<'a>(
    mut query: SummaryQuery<'a>,
    filters: &RecipeFilters,
) -> SummaryQuery<'a> {
    if let Some(food_type) = filters.food_type {
        query = query.filter(recipes::food_type.eq(food_type));
    }
    if let Some(min) = filters.cooking_time_min {
        query = query.filter(recipes::cooking_time.ge(min));
    }
    if let Some(max) = filters.cooking_time_max {
        query = query.filter(recipes::cooking_time.le(max));
    }
    if let Some(min) = filters.stars_min {
        query = query.filter(recipes::stars.ge(min));
    }
    if let Some(max) = filters.stars_max {
        query = query.filter(recipes::stars.le(max));
    }

    let window = filters.created_window(Utc::now().date_naive());
    if let Some(from) = window.from {
        query = query.filter(recipes::created_at.ge(from));
    }
    if let Some(until) = window.until {
        query = query.filter(recipes::created_at.lt(until));
    }

    if let Some(tag) = filters.tag() {
        query = query.filter(recipes::tags.contains(vec![Some(tag.to_string())]));
    }
    for pattern in filters.search_patterns() {
        query = query.filter(recipes::name.ilike(pattern));
    }

    query
}

pub fn apply_ordering<'a>(
    mut query: SummaryQuery<'a>,
    orderings: &[Ordering],
) -> SummaryQuery<'a> {
    for ordering in orderings {
        query = match (ordering.field, ordering.descending) {
            (SortField::Stars, false) => query.then_order_by(recipes::stars.asc()),
            (SortField::Stars, true) => query.then_order_by(recipes::stars.desc()),
            (SortField::CookingTime, false) => query.then_order_by(recipes::cooking_time.asc()),
            (SortField::CookingTime, true) => query.then_order_by(recipes::cooking_time.desc()),
            (SortField::Servings, false) => query.then_order_by(recipes::servings.asc()),
            (SortField::Servings, true) => query.then_order_by(recipes::servings.desc()),
            (SortField::Created, false) => query.then_order_by(recipes::created_at.asc()),
            (SortField::Created, true) => query.then_order_by(recipes::created_at.desc()),
        };
    }
    // Stable pages when sort keys tie
    query.then_order_by(recipes::id.asc())
}

/// Run a listing query for one page, with the total from `COUNT(*) OVER()`.
pub fn load_page(
    conn: &mut PgConnection,
    query: SummaryQuery<'_>,
    page: &PaginationParams,
    media_base_url: &str,
) -> Result<ListRecipesResponse, ApiError> {
    let (limit, offset) = page.resolve();

    let rows: Vec<(SummaryRow, Author, i64)> = query
        .select((SummaryRow::as_select(), Author::as_select(), count_over()))
        .limit(limit)
        .offset(offset)
        .load(conn)?;

    let total = rows.first().map(|(_, _, total)| *total).unwrap_or(0);

    let recipes = rows
        .into_iter()
        .map(|(row, author, _)| RecipeSummary::new(row, &author, media_base_url))
        .collect();

    Ok(ListRecipesResponse {
        recipes,
        pagination: PaginationMetadata {
            total,
            limit,
            offset,
        },
    })
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(RecipeFilters, PaginationParams),
    responses(
        (status = 200, description = "Published recipes", body = ListRecipesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    _viewer: MaybeUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Query(filters): Query<RecipeFilters>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ListRecipesResponse>, ApiError> {
    let mut conn = pool.get()?;

    let query = apply_filters(published_recipes(), &filters);
    let query = apply_ordering(query, &filters.ordering());

    let response = load_page(&mut conn, query, &page, &config.media_base_url)?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodType;
    use chrono::NaiveDate;
    use diesel::debug_query;
    use rust_decimal::Decimal;

    fn listing_sql(filters: RecipeFilters) -> String {
        let query = apply_filters(published_recipes(), &filters);
        let query = apply_ordering(query, &filters.ordering());
        debug_query::<Pg, _>(&query).to_string()
    }

    const NEWEST_FIRST: &str = r#"ORDER BY "recipes"."created_at" DESC, "recipes"."id" ASC"#;

    #[test]
    fn test_listing_always_filters_published() {
        let sql = listing_sql(RecipeFilters::default());
        assert!(sql.contains(r#""recipes"."published" = $1"#), "{}", sql);
        assert!(sql.contains(r#"INNER JOIN "users""#), "{}", sql);
        assert!(sql.contains(NEWEST_FIRST), "{}", sql);
    }

    #[test]
    fn test_food_type_filter() {
        let sql = listing_sql(RecipeFilters {
            food_type: Some(FoodType::Vegan),
            ..Default::default()
        });
        assert!(sql.contains(r#""recipes"."published" = $1"#), "{}", sql);
        assert!(sql.contains(r#""recipes"."food_type" = $2"#), "{}", sql);
        assert!(sql.contains("Vegan"), "{}", sql);
    }

    #[test]
    fn test_range_filters() {
        let sql = listing_sql(RecipeFilters {
            cooking_time_min: Some(10),
            cooking_time_max: Some(45),
            stars_min: Some(Decimal::new(35, 1)),
            stars_max: Some(Decimal::new(50, 1)),
            ..Default::default()
        });
        assert!(sql.contains(r#""recipes"."cooking_time" >= $"#), "{}", sql);
        assert!(sql.contains(r#""recipes"."cooking_time" <= $"#), "{}", sql);
        assert!(sql.contains(r#""recipes"."stars" >= $"#), "{}", sql);
        assert!(sql.contains(r#""recipes"."stars" <= $"#), "{}", sql);
    }

    #[test]
    fn test_created_dates_make_a_half_open_window() {
        let sql = listing_sql(RecipeFilters {
            created_after: NaiveDate::from_ymd_opt(2024, 2, 1),
            created_before: NaiveDate::from_ymd_opt(2024, 2, 29),
            ..Default::default()
        });
        assert!(sql.contains(r#""recipes"."created_at" >= $"#), "{}", sql);
        assert!(sql.contains(r#""recipes"."created_at" < $"#), "{}", sql);
        assert!(sql.contains("2024-03-01"), "{}", sql);
    }

    #[test]
    fn test_tag_and_search_terms() {
        let sql = listing_sql(RecipeFilters {
            tags: Some("soup".to_string()),
            search: Some("chicken soup".to_string()),
            ..Default::default()
        });
        assert!(sql.contains(r#""recipes"."tags" @> $"#), "{}", sql);
        assert_eq!(sql.matches(r#""recipes"."name" ILIKE $"#).count(), 2, "{}", sql);
        assert!(sql.contains("%chicken%"), "{}", sql);
        assert!(sql.contains("%soup%"), "{}", sql);
    }

    #[test]
    fn test_unknown_ordering_falls_back_to_newest_first() {
        let sql = listing_sql(RecipeFilters {
            ordering: Some("name".to_string()),
            ..Default::default()
        });
        assert!(sql.contains(NEWEST_FIRST), "{}", sql);
    }

    #[test]
    fn test_multi_key_ordering_keeps_id_tiebreak() {
        let sql = listing_sql(RecipeFilters {
            ordering: Some("-stars,cooking_time".to_string()),
            ..Default::default()
        });
        assert!(
            sql.contains(
                r#"ORDER BY "recipes"."stars" DESC, "recipes"."cooking_time" ASC, "recipes"."id" ASC"#
            ),
            "{}",
            sql
        );
    }
}
