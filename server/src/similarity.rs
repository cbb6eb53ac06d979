//! Related-recipe suggestions.
//!
//! Candidates are published recipes sharing at least one tag with the source
//! recipe. They are ranked by the number of shared tags, then by stars.

use crate::error::ApiError;
use crate::models::to_text_array;
use crate::schema::recipes;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::HashSet;
use uuid::Uuid;

pub const SIMILAR_LIMIT: usize = 4;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub stars: Decimal,
    pub image_id: Option<Uuid>,
    pub tags: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct Ranked {
    pub candidate: Candidate,
    pub shared_tags: usize,
}

/// Order candidates against the source recipe and keep the top few.
///
/// The source recipe itself and candidates with no tag in common are dropped.
pub fn rank_similar(
    source_id: Uuid,
    source_tags: &[String],
    candidates: Vec<Candidate>,
) -> Vec<Ranked> {
    let source: HashSet<&str> = source_tags.iter().map(String::as_str).collect();

    let mut ranked: Vec<Ranked> = candidates
        .into_iter()
        .filter(|c| c.id != source_id)
        .filter_map(|candidate| {
            let own: HashSet<&str> = candidate
                .tags
                .iter()
                .flatten()
                .map(String::as_str)
                .collect();
            let shared_tags = own.intersection(&source).count();
            (shared_tags > 0).then_some(Ranked {
                candidate,
                shared_tags,
            })
        })
        .collect();

    ranked.sort_by_key(|r| {
        (
            Reverse(r.shared_tags),
            Reverse(r.candidate.stars),
            r.candidate.id,
        )
    });
    ranked.truncate(SIMILAR_LIMIT);
    ranked
}

/// Load published recipes overlapping `source_tags` and rank them.
pub fn find_similar(
    conn: &mut PgConnection,
    source_id: Uuid,
    source_tags: &[String],
) -> Result<Vec<Ranked>, ApiError> {
    if source_tags.is_empty() {
        return Ok(Vec::new());
    }

    let candidates: Vec<Candidate> = recipes::table
        .filter(recipes::published.eq(true))
        .filter(recipes::id.ne(source_id))
        .filter(recipes::tags.overlaps_with(to_text_array(source_tags)))
        .select(Candidate::as_select())
        .load(conn)?;

    tracing::debug!(
        recipe_id = %source_id,
        candidates = candidates.len(),
        "ranking similar recipes"
    );

    Ok(rank_similar(source_id, source_tags, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u128, stars: i64, tags: &[&str]) -> Candidate {
        Candidate {
            id: Uuid::from_u128(id),
            name: format!("recipe {}", id),
            stars: Decimal::new(stars, 1),
            image_id: None,
            tags: tags.iter().map(|t| Some(t.to_string())).collect(),
        }
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    fn ids(ranked: &[Ranked]) -> Vec<u128> {
        ranked.iter().map(|r| r.candidate.id.as_u128()).collect()
    }

    #[test]
    fn test_orders_by_shared_tags_then_stars() {
        let source = tags(&["curry", "spicy", "dinner"]);
        let ranked = rank_similar(
            Uuid::from_u128(0),
            &source,
            vec![
                candidate(1, 50, &["curry"]),
                candidate(2, 10, &["curry", "spicy", "dinner"]),
                candidate(3, 45, &["curry", "spicy"]),
                candidate(4, 30, &["spicy", "dinner"]),
            ],
        );

        assert_eq!(ids(&ranked), vec![2, 3, 4, 1]);
        assert_eq!(
            ranked.iter().map(|r| r.shared_tags).collect::<Vec<_>>(),
            vec![3, 2, 2, 1]
        );
    }

    #[test]
    fn test_never_returns_source_recipe() {
        let source = tags(&["soup"]);
        let ranked = rank_similar(
            Uuid::from_u128(7),
            &source,
            vec![candidate(7, 50, &["soup"]), candidate(8, 20, &["soup"])],
        );
        assert_eq!(ids(&ranked), vec![8]);
    }

    #[test]
    fn test_drops_candidates_without_shared_tags() {
        let source = tags(&["soup"]);
        let ranked = rank_similar(
            Uuid::from_u128(0),
            &source,
            vec![candidate(1, 50, &["salad"]), candidate(2, 50, &[])],
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_limits_to_four() {
        let source = tags(&["cake"]);
        let candidates = (1..=9).map(|i| candidate(i, i as i64 * 5, &["cake"])).collect();
        let ranked = rank_similar(Uuid::from_u128(0), &source, candidates);

        assert_eq!(ranked.len(), SIMILAR_LIMIT);
        assert_eq!(ids(&ranked), vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_tag_matching_is_exact() {
        let source = tags(&["Dessert"]);
        let ranked = rank_similar(
            Uuid::from_u128(0),
            &source,
            vec![candidate(1, 40, &["dessert"]), candidate(2, 10, &["Dessert"])],
        );
        assert_eq!(ids(&ranked), vec![2]);
    }

    #[test]
    fn test_duplicate_tags_count_once() {
        let source = tags(&["pie", "pie"]);
        let ranked = rank_similar(
            Uuid::from_u128(0),
            &source,
            vec![candidate(1, 40, &["pie", "pie"])],
        );
        assert_eq!(ranked[0].shared_tags, 1);
    }

    #[test]
    fn test_equal_scores_break_ties_by_id() {
        let source = tags(&["bread"]);
        let ranked = rank_similar(
            Uuid::from_u128(0),
            &source,
            vec![candidate(3, 40, &["bread"]), candidate(2, 40, &["bread"])],
        );
        assert_eq!(ids(&ranked), vec![2, 3]);
    }
}
