use crate::api::ErrorResponse;
use crate::auth::{create_session, hash_password};
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_FULL_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    /// Shown instead of the username when set
    pub full_name: Option<String>,
}

impl SignupRequest {
    /// Trimmed username and full name. A blank full name counts as unset.
    fn validate(&self) -> Result<(&str, Option<&str>), ApiError> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if username.chars().count() > MAX_USERNAME_LEN {
            errors.add(
                "username",
                format!(
                    "Ensure this field has no more than {} characters.",
                    MAX_USERNAME_LEN
                ),
            );
        } else if username.chars().any(char::is_whitespace) {
            errors.add("username", "Usernames may not contain spaces.");
        }

        if self.password.is_empty() {
            errors.add("password", "This field may not be blank.");
        }

        let full_name = self
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if full_name.is_some_and(|n| n.chars().count() > MAX_FULL_NAME_LEN) {
            errors.add(
                "full_name",
                format!(
                    "Ensure this field has no more than {} characters.",
                    MAX_FULL_NAME_LEN
                ),
            );
        }

        errors.into_result()?;
        Ok((username, full_name))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({"username": "user", "password": "password", "full_name": "Jamie Oliver"})),
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(pool): State<Arc<DbPool>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(req) = payload?;
    let (username, full_name) = req.validate()?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        ApiError::Internal(format!("failed to hash password: {}", e))
    })?;

    let mut conn = pool.get()?;

    let user: User = diesel::insert_into(users::table)
        .values(&NewUser {
            username,
            password_hash: &password_hash,
            full_name,
        })
        .returning(User::as_returning())
        .get_result(&mut conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ApiError::Conflict("Username already exists".to_string())
            }
            other => ApiError::from(other),
        })?;

    let token = create_session(&mut conn, user.id)?;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str, full_name: Option<&str>) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_signup_trims_fields() {
        let req = request("  chef  ", "secret", Some("  Julia Child "));
        assert_eq!(req.validate().unwrap(), ("chef", Some("Julia Child")));
    }

    #[test]
    fn test_blank_full_name_is_unset() {
        let req = request("chef", "secret", Some("   "));
        assert_eq!(req.validate().unwrap(), ("chef", None));
    }

    #[test]
    fn test_missing_username_and_password() {
        match request(" ", "", None).validate() {
            Err(ApiError::Validation(fields)) => {
                assert!(fields.get("username").is_some());
                assert!(fields.get("password").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_username_with_spaces_is_rejected() {
        assert!(request("two words", "secret", None).validate().is_err());
    }
}
