//! Authorization rules for recipes and their questions.
//!
//! Inaccessible resources report "not found" so their existence is not
//! leaked. "Permission denied" is reserved for objects the caller can already
//! see.

use crate::error::ApiError;
use crate::models::Recipe;
use uuid::Uuid;

/// The parts of a recipe that authorization decisions depend on.
#[derive(Debug, Clone, Copy)]
pub struct RecipeAccess {
    pub author_id: Uuid,
    pub published: bool,
    pub allow_questions: bool,
}

impl From<&Recipe> for RecipeAccess {
    fn from(recipe: &Recipe) -> Self {
        RecipeAccess {
            author_id: recipe.user_id,
            published: recipe.published,
            allow_questions: recipe.allow_questions,
        }
    }
}

impl RecipeAccess {
    pub fn is_author(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.author_id)
    }

    /// Authors always see their own recipes; everyone else only published ones.
    pub fn check_view(&self, viewer: Option<Uuid>) -> Result<(), ApiError> {
        if self.is_author(viewer) || self.published {
            Ok(())
        } else {
            Err(ApiError::not_found("Recipe"))
        }
    }

    /// Only the author may update or delete, whatever the published state.
    pub fn check_modify(&self, actor: Uuid) -> Result<(), ApiError> {
        if self.is_author(Some(actor)) {
            return Ok(());
        }
        self.check_view(Some(actor))?;
        Err(ApiError::forbidden(
            "You do not have permission to perform this action.",
        ))
    }

    /// A new rating needs a published recipe.
    pub fn check_rate(&self) -> Result<(), ApiError> {
        if self.published {
            Ok(())
        } else {
            Err(ApiError::not_found("Recipe"))
        }
    }

    /// A caller who already rated the recipe can read that rating back even
    /// after the recipe is unpublished, matching what they may still edit.
    pub fn check_own_rating(&self, user_id: Uuid, has_rating: bool) -> Result<(), ApiError> {
        if has_rating {
            Ok(())
        } else {
            self.check_view(Some(user_id))
        }
    }

    pub fn check_ask(&self, asker: Uuid) -> Result<(), ApiError> {
        if !self.published || !self.allow_questions {
            return Err(ApiError::not_found("Recipe"));
        }
        if self.is_author(Some(asker)) {
            return Err(ApiError::forbidden("You cannot ask yourself a question."));
        }
        Ok(())
    }
}

pub const ALREADY_ANSWERED: &str = "This question has already been answered.";

/// Answers come from the recipe's author, once per question.
pub fn check_answer(
    recipe_author: Uuid,
    actor: Uuid,
    already_answered: bool,
) -> Result<(), ApiError> {
    if recipe_author != actor {
        return Err(ApiError::not_found("Question"));
    }
    if already_answered {
        return Err(ApiError::forbidden(ALREADY_ANSWERED));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const AUTHOR: Uuid = Uuid::from_u128(1);
    const READER: Uuid = Uuid::from_u128(2);

    fn recipe(published: bool, allow_questions: bool) -> RecipeAccess {
        RecipeAccess {
            author_id: AUTHOR,
            published,
            allow_questions,
        }
    }

    fn status<T: std::fmt::Debug>(result: Result<T, ApiError>) -> StatusCode {
        result.expect_err("expected an error").status()
    }

    #[test]
    fn test_published_recipe_is_visible_to_everyone() {
        let r = recipe(true, true);
        assert!(r.check_view(None).is_ok());
        assert!(r.check_view(Some(READER)).is_ok());
        assert!(r.check_view(Some(AUTHOR)).is_ok());
    }

    #[test]
    fn test_unpublished_recipe_is_hidden_from_non_authors() {
        let r = recipe(false, true);
        assert_eq!(status(r.check_view(None)), StatusCode::NOT_FOUND);
        assert_eq!(status(r.check_view(Some(READER))), StatusCode::NOT_FOUND);
        assert!(r.check_view(Some(AUTHOR)).is_ok());
    }

    #[test]
    fn test_author_can_always_modify() {
        assert!(recipe(true, true).check_modify(AUTHOR).is_ok());
        assert!(recipe(false, false).check_modify(AUTHOR).is_ok());
    }

    #[test]
    fn test_non_author_cannot_modify() {
        assert_eq!(
            status(recipe(true, true).check_modify(READER)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(recipe(false, true).check_modify(READER)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_rating_requires_published_recipe() {
        assert!(recipe(true, false).check_rate().is_ok());
        assert_eq!(status(recipe(false, true).check_rate()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_questions_need_published_recipe_with_questions_enabled() {
        assert!(recipe(true, true).check_ask(READER).is_ok());
        assert_eq!(
            status(recipe(false, true).check_ask(READER)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(recipe(true, false).check_ask(READER)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_author_cannot_ask_own_recipe() {
        match recipe(true, true).check_ask(AUTHOR) {
            Err(ApiError::Forbidden(message)) => {
                assert_eq!(message, "You cannot ask yourself a question.")
            }
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_only_recipe_author_answers() {
        assert!(check_answer(AUTHOR, AUTHOR, false).is_ok());
        assert_eq!(
            status(check_answer(AUTHOR, READER, false)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_second_answer_is_rejected() {
        match check_answer(AUTHOR, AUTHOR, true) {
            Err(ApiError::Forbidden(message)) => assert_eq!(message, ALREADY_ANSWERED),
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_own_rating_readable_after_unpublish() {
        let hidden = recipe(false, true);
        assert!(hidden.check_own_rating(READER, true).is_ok());
        assert_eq!(
            status(hidden.check_own_rating(READER, false)),
            StatusCode::NOT_FOUND
        );
        assert!(hidden.check_own_rating(AUTHOR, false).is_ok());
        assert!(recipe(true, true).check_own_rating(READER, false).is_ok());
    }
}
