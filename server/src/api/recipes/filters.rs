//! Query parameters accepted by the public recipe listing.

use crate::models::FoodType;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecipeFilters {
    /// Exact food type
    pub food_type: Option<FoodType>,
    /// Minimum cooking time in minutes (inclusive)
    pub cooking_time_min: Option<i16>,
    /// Maximum cooking time in minutes (inclusive)
    pub cooking_time_max: Option<i16>,
    /// Minimum average stars (inclusive)
    #[param(value_type = Option<String>, example = "3.5")]
    pub stars_min: Option<Decimal>,
    /// Maximum average stars (inclusive)
    #[param(value_type = Option<String>, example = "5.0")]
    pub stars_max: Option<Decimal>,
    /// Creation period relative to today
    pub created: Option<CreatedPreset>,
    /// Created on or after this date (YYYY-MM-DD)
    pub created_after: Option<NaiveDate>,
    /// Created on or before this date (YYYY-MM-DD)
    pub created_before: Option<NaiveDate>,
    /// Exact tag
    pub tags: Option<String>,
    /// Terms separated by spaces or commas; each must appear in the recipe
    /// name, ignoring case
    pub search: Option<String>,
    /// Comma-separated sort keys: stars, cooking_time, servings, created.
    /// Prefix with `-` for descending. Default: -created
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CreatedPreset {
    Today,
    Yesterday,
    /// The past 7 days, today included
    Week,
    /// The current calendar month
    Month,
    /// The current calendar year
    Year,
}

impl CreatedPreset {
    /// Inclusive `(first, last)` day covered by the preset.
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        match self {
            CreatedPreset::Today => (today, today),
            CreatedPreset::Yesterday => (yesterday, yesterday),
            CreatedPreset::Week => (
                today.checked_sub_days(Days::new(6)).unwrap_or(today),
                today,
            ),
            CreatedPreset::Month => (today.with_day(1).unwrap_or(today), today),
            CreatedPreset::Year => (today.with_ordinal(1).unwrap_or(today), today),
        }
    }
}

/// Half-open `[from, until)` timestamp window from inclusive day bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreatedWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl RecipeFilters {
    /// Combine the preset and explicit dates. When both constrain the same
    /// side, the narrower one wins.
    pub fn created_window(&self, today: NaiveDate) -> CreatedWindow {
        let preset = self.created.map(|p| p.bounds(today));

        let first = [preset.map(|(first, _)| first), self.created_after]
            .into_iter()
            .flatten()
            .max();
        let last = [preset.map(|(_, last)| last), self.created_before]
            .into_iter()
            .flatten()
            .min();

        CreatedWindow {
            from: first.map(day_start),
            until: last.map(|d| day_start(d.checked_add_days(Days::new(1)).unwrap_or(d))),
        }
    }

    /// One `ILIKE` pattern per search term. Terms are split on whitespace and
    /// commas, and a recipe must match all of them.
    pub fn search_patterns(&self) -> Vec<String> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|term| !term.is_empty())
            .map(like_pattern)
            .collect()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tags.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn ordering(&self) -> Vec<Ordering> {
        Ordering::parse(self.ordering.as_deref())
    }
}

/// Wrap `text` for a substring `ILIKE`, escaping its wildcards.
pub fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Stars,
    CookingTime,
    Servings,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: SortField,
    pub descending: bool,
}

impl Ordering {
    pub const DEFAULT: Ordering = Ordering {
        field: SortField::Created,
        descending: true,
    };

    fn parse_one(term: &str) -> Option<Ordering> {
        let (descending, name) = match term.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, term),
        };
        let field = match name {
            "stars" => SortField::Stars,
            "cooking_time" => SortField::CookingTime,
            "servings" => SortField::Servings,
            "created" => SortField::Created,
            _ => return None,
        };
        Some(Ordering { field, descending })
    }

    /// Parse a comma-separated ordering. Anything unrecognised falls back to
    /// newest first.
    pub fn parse(raw: Option<&str>) -> Vec<Ordering> {
        let terms: Vec<&str> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let parsed: Option<Vec<Ordering>> = terms.iter().map(|t| Self::parse_one(t)).collect();
        match parsed {
            Some(orderings) if !orderings.is_empty() => orderings,
            _ => vec![Self::DEFAULT],
        }
    }
}
