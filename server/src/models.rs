use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
}

/// The public columns of a user, as shown next to recipes, ratings and questions.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// Full name when one is set, otherwise the username.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

impl From<User> for Author {
    fn from(user: User) -> Self {
        Author {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImage<'a> {
    pub user_id: Uuid,
    pub content_type: &'a str,
    pub data: &'a [u8],
    pub small: &'a [u8],
    pub medium: &'a [u8],
}

/// Dietary category of a recipe, stored as its display label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    utoipa::ToSchema,
)]
#[diesel(sql_type = Text)]
pub enum FoodType {
    Vegetarian,
    #[serde(rename = "Non-Vegetarian")]
    NonVegetarian,
    Eggetarian,
    Vegan,
}

impl FoodType {
    pub const ALL: [FoodType; 4] = [
        FoodType::Vegetarian,
        FoodType::NonVegetarian,
        FoodType::Eggetarian,
        FoodType::Vegan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::Vegetarian => "Vegetarian",
            FoodType::NonVegetarian => "Non-Vegetarian",
            FoodType::Eggetarian => "Eggetarian",
            FoodType::Vegan => "Vegan",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid food type")]
pub struct UnknownFoodType(pub String);

impl FromStr for FoodType {
    type Err = UnknownFoodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FoodType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFoodType(s.to_string()))
    }
}

impl ToSql<Text, Pg> for FoodType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for FoodType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_type: FoodType,
    pub image_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub stars: Decimal,
    pub servings: i16,
    pub cooking_time: i16,
    pub ingredients: Vec<Option<String>>,
    pub steps: Vec<Option<String>>,
    pub tags: Vec<Option<String>>,
    pub allow_questions: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub user_id: Uuid,
    pub food_type: FoodType,
    pub image_id: Option<Uuid>,
    pub name: &'a str,
    pub description: &'a str,
    pub servings: i16,
    pub cooking_time: i16,
    pub ingredients: &'a [Option<String>],
    pub steps: &'a [Option<String>],
    pub tags: &'a [Option<String>],
    pub allow_questions: bool,
    pub published: bool,
}

/// Partial recipe update. `None` leaves the column untouched.
#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChanges {
    pub food_type: Option<FoodType>,
    pub image_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i16>,
    pub cooking_time: Option<i16>,
    pub ingredients: Option<Vec<Option<String>>>,
    pub steps: Option<Vec<Option<String>>>,
    pub tags: Option<Vec<Option<String>>>,
    pub allow_questions: Option<bool>,
    pub published: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Rating {
    pub id: Uuid,
    pub stars: i16,
    pub body: String,
    pub edited: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ratings)]
pub struct NewRating<'a> {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub stars: i16,
    pub body: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Question {
    pub id: Uuid,
    pub question: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::questions)]
pub struct NewQuestion<'a> {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub question: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::answers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Answer {
    pub question_id: Uuid,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::answers)]
pub struct NewAnswer<'a> {
    pub question_id: Uuid,
    pub response: &'a str,
}

/// Collapse a nullable-element text array into plain strings.
pub fn flatten_text(values: Vec<Option<String>>) -> Vec<String> {
    values.into_iter().flatten().collect()
}

/// Wrap plain strings for a nullable-element text array column.
pub fn to_text_array(values: &[String]) -> Vec<Option<String>> {
    values.iter().cloned().map(Some).collect()
}
