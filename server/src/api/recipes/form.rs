//! Recipe submissions, accepted as JSON or as multipart form data.
//!
//! Multipart clients cannot send lists directly, so `ingredients`, `steps`
//! and `tags` arrive as JSON-encoded strings and are decoded here before
//! validation. An optional `image` part carries the recipe image.

use crate::error::{ApiError, FieldErrors};
use crate::models::{to_text_array, FoodType, RecipeChanges};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_INGREDIENT_LEN: usize = 100;
pub const MAX_STEP_LEN: usize = 250;
pub const MAX_TAG_LEN: usize = 100;
pub const MAX_SERVINGS: i16 = 10;

const LIST_FIELDS: &[&str] = &["ingredients", "steps", "tags"];
const IMAGE_FIELD: &str = "image";

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const EMPTY_LIST: &str = "This list may not be empty.";
const NOT_INTEGER: &str = "A valid integer is required.";
const NOT_BOOLEAN: &str = "Must be a valid boolean.";
const NOT_STRING: &str = "Not a valid string.";
const NOT_LIST: &str = "Expected a list of strings.";

/// Recipe fields as submitted. Every field is optional here; creation
/// checks for the required ones, updates only touch what is present.
#[derive(Debug, Default, ToSchema)]
pub struct RecipeFields {
    pub food_type: Option<FoodType>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Number of servings, 0 to 10
    pub servings: Option<i16>,
    /// Cooking time in minutes
    pub cooking_time: Option<i16>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub allow_questions: Option<bool>,
    pub published: Option<bool>,
}

/// Multipart form for recipe submissions. List fields are JSON-encoded strings.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RecipeMultipartRequest {
    pub food_type: Option<FoodType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i16>,
    pub cooking_time: Option<i16>,
    /// JSON-encoded list of strings, e.g. `["2 eggs", "1 cup flour"]`
    pub ingredients: Option<String>,
    /// JSON-encoded list of strings
    pub steps: Option<String>,
    /// JSON-encoded list of strings
    pub tags: Option<String>,
    pub allow_questions: Option<bool>,
    pub published: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// A submitted recipe plus the raw bytes of an uploaded image, if any.
#[derive(Debug)]
pub struct RecipeForm {
    pub fields: RecipeFields,
    /// Fields that could not be decoded at all. Validation reports these
    /// alongside its own findings.
    pub errors: FieldErrors,
    pub image: Option<Bytes>,
}

impl<S> FromRequest<S> for RecipeForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        let mut errors = FieldErrors::new();

        if !is_multipart {
            let Json(values) = Json::<Map<String, Value>>::from_request(req, state).await?;
            let fields = RecipeFields::from_values(values, &mut errors);
            return Ok(RecipeForm {
                fields,
                errors,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut values = Map::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let data = field.bytes().await?;
                if !data.is_empty() {
                    image = Some(data);
                }
                continue;
            }

            let text = field.text().await?;
            match decode_form_value(&name, &text) {
                Ok(value) => {
                    values.insert(name, value);
                }
                Err(message) => errors.add(&name, message),
            }
        }

        let fields = RecipeFields::from_values(values, &mut errors);

        Ok(RecipeForm {
            fields,
            errors,
            image,
        })
    }
}

/// Turn one multipart text part into a JSON value. List fields carry
/// JSON-encoded arrays; everything else stays a string and is parsed with
/// the rest of the fields.
pub fn decode_form_value(name: &str, raw: &str) -> Result<Value, String> {
    if LIST_FIELDS.contains(&name) {
        return match serde_json::from_str::<Value>(raw) {
            Ok(list @ Value::Array(_)) => Ok(list),
            _ => Err("Expected a JSON-encoded list of strings.".to_string()),
        };
    }
    Ok(Value::String(raw.to_string()))
}

/// A fully validated new recipe.
#[derive(Debug)]
pub struct NewRecipeInput {
    pub food_type: FoodType,
    pub name: String,
    pub description: String,
    pub servings: i16,
    pub cooking_time: i16,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub allow_questions: bool,
    pub published: bool,
}

impl RecipeFields {
    /// Pick the known fields out of a decoded body. Each value is typed on its
    /// own so a bad one is reported against its field name. Nulls count as
    /// absent and unknown keys are ignored.
    pub fn from_values(values: Map<String, Value>, errors: &mut FieldErrors) -> RecipeFields {
        let mut fields = RecipeFields::default();
        for (name, value) in values {
            if value.is_null() {
                continue;
            }
            let field = name.as_str();
            match field {
                "food_type" => fields.food_type = choice_value(errors, field, value),
                "name" => fields.name = string_value(errors, field, value),
                "description" => fields.description = string_value(errors, field, value),
                "servings" => fields.servings = integer_value(errors, field, &value),
                "cooking_time" => fields.cooking_time = integer_value(errors, field, &value),
                "ingredients" => fields.ingredients = list_value(errors, field, value),
                "steps" => fields.steps = list_value(errors, field, value),
                "tags" => fields.tags = list_value(errors, field, value),
                "allow_questions" => fields.allow_questions = bool_value(errors, field, &value),
                "published" => fields.published = bool_value(errors, field, &value),
                _ => {}
            }
        }
        fields
    }

    /// Validate a creation request; every field except tags and flags is required.
    /// `errors` holds anything already found while decoding.
    pub fn validate_new(self, mut errors: FieldErrors) -> Result<NewRecipeInput, ApiError> {
        let checked = self.check(&mut errors);

        for (field, missing) in [
            ("food_type", checked.food_type.is_none()),
            ("name", checked.name.is_none()),
            ("description", checked.description.is_none()),
            ("servings", checked.servings.is_none()),
            ("cooking_time", checked.cooking_time.is_none()),
            ("ingredients", checked.ingredients.is_none()),
            ("steps", checked.steps.is_none()),
        ] {
            if missing && errors.get(field).is_none() {
                errors.add(field, REQUIRED);
            }
        }
        errors.into_result()?;

        match checked {
            RecipeFields {
                food_type: Some(food_type),
                name: Some(name),
                description: Some(description),
                servings: Some(servings),
                cooking_time: Some(cooking_time),
                ingredients: Some(ingredients),
                steps: Some(steps),
                tags,
                allow_questions,
                published,
            } => Ok(NewRecipeInput {
                food_type,
                name,
                description,
                servings,
                cooking_time,
                ingredients,
                steps,
                tags: tags.unwrap_or_default(),
                allow_questions: allow_questions.unwrap_or(true),
                published: published.unwrap_or(true),
            }),
            _ => Err(ApiError::BadRequest("Incomplete recipe".to_string())),
        }
    }

    /// Validate a partial update; absent fields are left unchanged.
    pub fn validate_changes(self, mut errors: FieldErrors) -> Result<RecipeChanges, ApiError> {
        let checked = self.check(&mut errors);
        errors.into_result()?;

        Ok(RecipeChanges {
            food_type: checked.food_type,
            image_id: None,
            name: checked.name,
            description: checked.description,
            servings: checked.servings,
            cooking_time: checked.cooking_time,
            ingredients: checked.ingredients.as_deref().map(to_text_array),
            steps: checked.steps.as_deref().map(to_text_array),
            tags: checked.tags.as_deref().map(to_text_array),
            allow_questions: checked.allow_questions,
            published: checked.published,
            updated_at: Some(Utc::now()),
        })
    }

    /// Check and normalize every present field. Invalid fields are recorded
    /// in `errors` and dropped from the result.
    fn check(self, errors: &mut FieldErrors) -> RecipeFields {
        RecipeFields {
            food_type: self.food_type,
            name: self
                .name
                .and_then(|v| check_text(errors, "name", v, Some(MAX_NAME_LEN))),
            description: self
                .description
                .and_then(|v| check_text(errors, "description", v, None)),
            servings: self
                .servings
                .and_then(|v| check_range(errors, "servings", v, 0, MAX_SERVINGS)),
            cooking_time: self
                .cooking_time
                .and_then(|v| check_range(errors, "cooking_time", v, 0, i16::MAX)),
            ingredients: self
                .ingredients
                .and_then(|v| check_list(errors, "ingredients", v, MAX_INGREDIENT_LEN)),
            steps: self
                .steps
                .and_then(|v| check_list(errors, "steps", v, MAX_STEP_LEN)),
            tags: self.tags.and_then(|v| normalize_tags(errors, v)),
            allow_questions: self.allow_questions,
            published: self.published,
        }
    }
}

fn choice_value(errors: &mut FieldErrors, field: &str, value: Value) -> Option<FoodType> {
    match serde_json::from_value(value.clone()) {
        Ok(choice) => Some(choice),
        Err(_) => {
            errors.add(field, format!("{} is not a valid choice.", value));
            None
        }
    }
}

fn string_value(errors: &mut FieldErrors, field: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.add(field, NOT_STRING);
            None
        }
    }
}

/// Integers may arrive as JSON numbers or as numeric strings.
fn integer_value(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<i16> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let Some(n) = parsed else {
        errors.add(field, NOT_INTEGER);
        return None;
    };

    match i16::try_from(n) {
        Ok(n) => Some(n),
        Err(_) if n > 0 => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", i16::MAX),
            );
            None
        }
        Err(_) => {
            errors.add(
                field,
                format!("Ensure this value is greater than or equal to {}.", i16::MIN),
            );
            None
        }
    }
}

fn bool_value(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, NOT_BOOLEAN);
    }
    parsed
}

fn list_value(errors: &mut FieldErrors, field: &str, value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        errors.add(field, NOT_LIST);
        return None;
    };

    let mut valid = true;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::String(s) => out.push(s),
            _ => {
                errors.add(field, format!("Item {}: {}", i, NOT_STRING));
                valid = false;
            }
        }
    }
    valid.then_some(out)
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

fn check_text(
    errors: &mut FieldErrors,
    field: &str,
    value: String,
    max_len: Option<usize>,
) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.add(field, too_long(max));
            return None;
        }
    }
    Some(value)
}

fn check_range(
    errors: &mut FieldErrors,
    field: &str,
    value: i16,
    min: i16,
    max: i16,
) -> Option<i16> {
    if value < min {
        errors.add(
            field,
            format!("Ensure this value is greater than or equal to {}.", min),
        );
        return None;
    }
    if value > max {
        errors.add(
            field,
            format!("Ensure this value is less than or equal to {}.", max),
        );
        return None;
    }
    Some(value)
}

fn check_list(
    errors: &mut FieldErrors,
    field: &str,
    values: Vec<String>,
    max_len: usize,
) -> Option<Vec<String>> {
    if values.is_empty() {
        errors.add(field, EMPTY_LIST);
        return None;
    }

    let mut valid = true;
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        let value = value.trim().to_string();
        if value.is_empty() {
            errors.add(field, format!("Item {}: {}", i, BLANK));
            valid = false;
        } else if value.chars().count() > max_len {
            errors.add(field, format!("Item {}: {}", i, too_long(max_len)));
            valid = false;
        } else {
            out.push(value);
        }
    }

    valid.then_some(out)
}

/// Trim, reject blanks and overlong tags, and drop repeats keeping the first.
fn normalize_tags(errors: &mut FieldErrors, values: Vec<String>) -> Option<Vec<String>> {
    let mut valid = true;
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let tag = value.trim().to_string();
        if tag.is_empty() {
            errors.add("tags", "Tags may not be blank.");
            valid = false;
        } else if tag.chars().count() > MAX_TAG_LEN {
            errors.add("tags", too_long(MAX_TAG_LEN));
            valid = false;
        } else if !out.contains(&tag) {
            out.push(tag);
        }
    }
    valid.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    fn complete() -> RecipeFields {
        RecipeFields {
            food_type: Some(FoodType::Vegan),
            name: Some("Chana masala".to_string()),
            description: Some("Chickpeas in a spiced tomato gravy".to_string()),
            servings: Some(4),
            cooking_time: Some(40),
            ingredients: Some(vec!["1 can chickpeas".to_string()]),
            steps: Some(vec!["Simmer everything".to_string()]),
            tags: None,
            allow_questions: None,
            published: None,
        }
    }

    fn field_errors(result: Result<impl std::fmt::Debug, ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_list_fields_are_json_decoded() {
        assert_eq!(
            decode_form_value("ingredients", r#"["2 eggs", "salt"]"#).unwrap(),
            json!(["2 eggs", "salt"])
        );
        assert!(decode_form_value("tags", "dinner").is_err());
        assert!(decode_form_value("steps", r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_scalar_parts_stay_strings_until_typed() {
        assert_eq!(decode_form_value("servings", "4").unwrap(), json!("4"));
        assert_eq!(decode_form_value("name", "42").unwrap(), json!("42"));
    }

    #[test]
    fn test_decoded_form_values_are_typed() {
        let mut values = Map::new();
        for (name, raw) in [
            ("food_type", "Non-Vegetarian"),
            ("servings", "2"),
            ("published", "off"),
            ("allow_questions", "True"),
            ("tags", r#"["quick"]"#),
        ] {
            values.insert(name.to_string(), decode_form_value(name, raw).unwrap());
        }
        let mut errors = FieldErrors::new();
        let fields = RecipeFields::from_values(values, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(fields.food_type, Some(FoodType::NonVegetarian));
        assert_eq!(fields.servings, Some(2));
        assert_eq!(fields.published, Some(false));
        assert_eq!(fields.allow_questions, Some(true));
        assert_eq!(fields.tags, Some(vec!["quick".to_string()]));
    }

    #[test]
    fn test_nulls_and_unknown_keys_are_ignored() {
        let values = json!({"name": null, "colour": "blue", "servings": 3});
        let Value::Object(values) = values else {
            unreachable!()
        };
        let mut errors = FieldErrors::new();
        let fields = RecipeFields::from_values(values, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(fields.name, None);
        assert_eq!(fields.servings, Some(3));
    }

    fn json_request(body: Value) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/recipes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, &str)]) -> Request {
        let boundary = "recipe-form-boundary";
        let mut body = String::new();
        for (name, value) in parts {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        axum::http::Request::builder()
            .method("POST")
            .uri("/api/recipes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_bad_choice_is_a_field_error() {
        let mut body = json!({
            "name": "Chana masala",
            "description": "Chickpeas",
            "servings": 4,
            "cooking_time": 40,
            "ingredients": ["chickpeas"],
            "steps": ["Simmer"],
        });
        body["food_type"] = json!("Pescatarian");

        let form = RecipeForm::from_request(json_request(body), &()).await.unwrap();
        let errors = field_errors(form.fields.validate_new(form.errors));
        assert_eq!(
            errors.get("food_type"),
            Some(&["\"Pescatarian\" is not a valid choice.".to_string()][..])
        );
        assert_eq!(errors.get("name"), None);
    }

    #[tokio::test]
    async fn test_json_out_of_range_integer_is_a_field_error() {
        let body = json!({"cooking_time": 40000, "servings": "four"});
        let form = RecipeForm::from_request(json_request(body), &()).await.unwrap();
        let errors = field_errors(form.fields.validate_changes(form.errors));
        assert_eq!(
            errors.get("cooking_time"),
            Some(&["Ensure this value is less than or equal to 32767.".to_string()][..])
        );
        assert_eq!(
            errors.get("servings"),
            Some(&[NOT_INTEGER.to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_multipart_bad_integer_reported_with_missing_fields() {
        let req = multipart_request(&[
            ("food_type", "Vegan"),
            ("servings", "four"),
            ("ingredients", r#"["chickpeas"]"#),
        ]);
        let form = RecipeForm::from_request(req, &()).await.unwrap();
        assert!(form.image.is_none());

        let errors = field_errors(form.fields.validate_new(form.errors));
        assert_eq!(
            errors.get("servings"),
            Some(&[NOT_INTEGER.to_string()][..])
        );
        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("food_type"), None);
        assert_eq!(errors.get("ingredients"), None);
    }

    #[tokio::test]
    async fn test_multipart_bad_boolean_and_list() {
        let req = multipart_request(&[("published", "maybe"), ("tags", "dinner")]);
        let form = RecipeForm::from_request(req, &()).await.unwrap();
        let errors = field_errors(form.fields.validate_changes(form.errors));
        assert_eq!(errors.get("published"), Some(&[NOT_BOOLEAN.to_string()][..]));
        assert!(errors.get("tags").is_some());
    }

    #[test]
    fn test_non_string_list_items_rejected() {
        let Value::Object(values) = json!({"steps": ["Boil", 3]}) else {
            unreachable!()
        };
        let mut errors = FieldErrors::new();
        let fields = RecipeFields::from_values(values, &mut errors);
        assert_eq!(fields.steps, None);
        assert_eq!(
            errors.get("steps"),
            Some(&[format!("Item 1: {}", NOT_STRING)][..])
        );
    }

    #[test]
    fn test_complete_recipe_validates_with_defaults() {
        let input = complete().validate_new(FieldErrors::new()).unwrap();
        assert!(input.published);
        assert!(input.allow_questions);
        assert!(input.tags.is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let errors = field_errors(RecipeFields::default().validate_new(FieldErrors::new()));
        for field in [
            "food_type",
            "name",
            "description",
            "servings",
            "cooking_time",
            "ingredients",
            "steps",
        ] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_string()][..]), "{}", field);
        }
    }

    #[test]
    fn test_servings_bounded_by_ten() {
        let mut fields = complete();
        fields.servings = Some(11);
        let errors = field_errors(fields.validate_new(FieldErrors::new()));
        assert_eq!(
            errors.get("servings"),
            Some(&["Ensure this value is less than or equal to 10.".to_string()][..])
        );
    }

    #[test]
    fn test_negative_cooking_time_rejected() {
        let mut fields = complete();
        fields.cooking_time = Some(-5);
        assert!(field_errors(fields.validate_new(FieldErrors::new())).get("cooking_time").is_some());
    }

    #[test]
    fn test_blank_and_overlong_text_rejected() {
        let mut fields = complete();
        fields.name = Some("   ".to_string());
        fields.ingredients = Some(vec!["x".repeat(MAX_INGREDIENT_LEN + 1)]);
        fields.steps = Some(vec![]);
        let errors = field_errors(fields.validate_new(FieldErrors::new()));
        assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));
        assert!(errors.get("ingredients").is_some());
        assert_eq!(errors.get("steps"), Some(&[EMPTY_LIST.to_string()][..]));
    }

    #[test]
    fn test_tags_trimmed_and_deduplicated() {
        let mut fields = complete();
        fields.tags = Some(vec![
            " curry ".to_string(),
            "curry".to_string(),
            "weeknight".to_string(),
        ]);
        let input = fields.validate_new(FieldErrors::new()).unwrap();
        assert_eq!(input.tags, vec!["curry", "weeknight"]);
    }

    #[test]
    fn test_blank_tag_rejected() {
        let mut fields = complete();
        fields.tags = Some(vec!["".to_string()]);
        assert!(field_errors(fields.validate_new(FieldErrors::new())).get("tags").is_some());
    }

    #[test]
    fn test_changes_only_touch_present_fields() {
        let fields = RecipeFields {
            published: Some(false),
            name: Some(" Better name ".to_string()),
            ..Default::default()
        };
        let changes = fields.validate_changes(FieldErrors::new()).unwrap();
        assert_eq!(changes.published, Some(false));
        assert_eq!(changes.name.as_deref(), Some("Better name"));
        assert!(changes.description.is_none());
        assert!(changes.ingredients.is_none());
        assert!(changes.image_id.is_none());
        assert!(changes.updated_at.is_some());
    }

    #[test]
    fn test_invalid_changes_rejected() {
        let fields = RecipeFields {
            servings: Some(12),
            ..Default::default()
        };
        assert!(field_errors(fields.validate_changes(FieldErrors::new())).get("servings").is_some());
    }
}
