use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::books::models::Book;
use crate::utils::not_blank;
use crate::views::{Resource, ResourceKind};

/// An author and the books they own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub books: Vec<Book>,
}

impl Resource for Author {
    const KIND: ResourceKind = ResourceKind::Author;
}

/// Decoded body of an author create or update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInput {
    #[validate(
        required(message = "The first name is required."),
        length(
            min = 1,
            max = 255,
            message = "The first name must be between 1 and 255 characters long."
        ),
        custom(function = "not_blank")
    )]
    pub first_name: Option<String>,

    #[validate(
        required(message = "The last name is required."),
        length(
            min = 1,
            max = 255,
            message = "The last name must be between 1 and 255 characters long."
        ),
        custom(function = "not_blank")
    )]
    pub last_name: Option<String>,
}

/// Validated column values of an author row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDraft {
    pub first_name: String,
    pub last_name: String,
}

impl AuthorInput {
    /// Populate `current` with the fields present in this input.
    pub fn merged_onto(self, current: &Author) -> Self {
        Self {
            first_name: self.first_name.or_else(|| Some(current.first_name.clone())),
            last_name: self.last_name.or_else(|| Some(current.last_name.clone())),
        }
    }

    pub fn into_draft(self) -> AuthorDraft {
        AuthorDraft {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
        }
    }
}
