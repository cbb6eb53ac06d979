//! Star rating aggregation.
//!
//! A recipe's displayed `stars` is the arithmetic mean of the integer star
//! values of its ratings, stored with exactly one decimal place. A recipe with
//! no ratings has `0.0`.

use crate::error::ApiError;
use crate::schema::{ratings, recipes};
use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

pub const MIN_STARS: i16 = 1;
pub const MAX_STARS: i16 = 5;

/// Mean of `values` to one decimal place.
///
/// The mean is taken as an `f64` and its exact binary value is rounded half
/// to even. So 4.25 becomes 4.2, while 2.45 (stored just above the midpoint)
/// becomes 2.5.
pub fn average_stars(values: &[i16]) -> Decimal {
    let mut average = if values.is_empty() {
        Decimal::ZERO
    } else {
        let total: i64 = values.iter().map(|&v| i64::from(v)).sum();
        let mean = total as f64 / values.len() as f64;
        Decimal::from_f64_retain(mean)
            .unwrap_or_default()
            .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
    };
    average.rescale(1);
    average
}

/// Recompute and store the average for one recipe.
///
/// Must run on the same connection (and transaction) as the rating write so
/// the next read of the recipe sees the new value.
pub fn recompute_recipe_stars(
    conn: &mut PgConnection,
    recipe_id: Uuid,
) -> Result<Decimal, ApiError> {
    let values: Vec<i16> = ratings::table
        .filter(ratings::recipe_id.eq(recipe_id))
        .select(ratings::stars)
        .load(conn)?;

    let stars = average_stars(&values);

    diesel::update(recipes::table.find(recipe_id))
        .set((
            recipes::stars.eq(stars),
            recipes::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    tracing::debug!(
        recipe_id = %recipe_id,
        ratings = values.len(),
        stars = %stars,
        "recomputed recipe stars"
    );

    Ok(stars)
}

/// Count of ratings per observed star value, ascending by stars.
pub fn rating_groups(
    conn: &mut PgConnection,
    recipe_id: Uuid,
) -> Result<Vec<(i16, i64)>, ApiError> {
    let groups = ratings::table
        .filter(ratings::recipe_id.eq(recipe_id))
        .group_by(ratings::stars)
        .select((ratings::stars, diesel::dsl::count_star()))
        .order(ratings::stars.asc())
        .load(conn)?;

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ratings_is_zero() {
        assert_eq!(average_stars(&[]).to_string(), "0.0");
    }

    #[test]
    fn test_single_rating() {
        assert_eq!(average_stars(&[4]).to_string(), "4.0");
    }

    #[test]
    fn test_exact_half() {
        assert_eq!(average_stars(&[4, 5]).to_string(), "4.5");
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        // 5/3 = 1.666...
        assert_eq!(average_stars(&[1, 2, 2]).to_string(), "1.7");
        // 13/3 = 4.333...
        assert_eq!(average_stars(&[4, 4, 5]).to_string(), "4.3");
    }

    #[test]
    fn test_exact_midpoint_rounds_to_even() {
        // 17/4 = 4.25
        assert_eq!(average_stars(&[4, 4, 4, 5]).to_string(), "4.2");
        // 15/4 = 3.75
        assert_eq!(average_stars(&[3, 4, 4, 4]).to_string(), "3.8");
        // 5/4 = 1.25
        assert_eq!(average_stars(&[1, 1, 1, 2]).to_string(), "1.2");
    }

    #[test]
    fn test_inexact_midpoint_follows_float_value() {
        // 49/20 = 2.45, whose nearest f64 is slightly above 2.45
        let mut values = vec![2; 11];
        values.extend(vec![3; 9]);
        assert_eq!(average_stars(&values).to_string(), "2.5");
    }

    #[test]
    fn test_result_stays_within_star_bounds() {
        let all_max = vec![MAX_STARS; 1000];
        assert_eq!(average_stars(&all_max), Decimal::new(50, 1));
        let all_min = vec![MIN_STARS; 7];
        assert_eq!(average_stars(&all_min), Decimal::new(10, 1));
    }

    #[test]
    fn test_recompute_after_removal_uses_remaining_set() {
        let mut values = vec![1, 5, 5];
        assert_eq!(average_stars(&values).to_string(), "3.7");
        values.remove(0);
        assert_eq!(average_stars(&values).to_string(), "5.0");
        values.clear();
        assert_eq!(average_stars(&values).to_string(), "0.0");
    }
}
