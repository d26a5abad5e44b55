use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::authors::models::Author;
use crate::utils::not_blank;
use crate::views::{Resource, ResourceKind};

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Back-cover blurb
    pub cover_text: Option<String>,
    /// Owning author, if any
    pub author: Option<Author>,
}

impl Resource for Book {
    const KIND: ResourceKind = ResourceKind::Book;
}

/// Decoded body of a book create or update.
///
/// The `idAuthor` field is read from the raw body, not from here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[validate(
        required(message = "The book title is required."),
        length(
            min = 1,
            max = 255,
            message = "The title must be between 1 and 255 characters long."
        ),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "The cover text must be between 1 and 255 characters long."
    ))]
    pub cover_text: Option<String>,
}

/// Validated column values of a book row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub cover_text: Option<String>,
    pub author_id: Option<i64>,
}

impl BookInput {
    /// Turn an input that passed validation into column values.
    pub fn into_draft(self, author_id: Option<i64>) -> BookDraft {
        BookDraft {
            title: self.title.unwrap_or_default(),
            cover_text: self.cover_text,
            author_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_title_is_a_violation() {
        let errors = BookInput::default().validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn blank_title_is_a_violation() {
        let input = BookInput {
            title: Some("   ".to_string()),
            cover_text: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn overlong_cover_text_is_a_violation() {
        let input = BookInput {
            title: Some("Dune".to_string()),
            cover_text: Some("x".repeat(256)),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cover_text"));
    }

    #[test]
    fn valid_input_becomes_a_draft() {
        let input: BookInput =
            serde_json::from_str(r#"{"title":"Dune","coverText":"Spice","idAuthor":7}"#).unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(
            input.into_draft(Some(7)),
            BookDraft {
                title: "Dune".to_string(),
                cover_text: Some("Spice".to_string()),
                author_id: Some(7),
            }
        );
    }
}
