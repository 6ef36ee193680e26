use serde::Deserialize;

use crate::model::book::CATEGORIES;

/// Form payload for the registration page. The browser form uses
/// hyphenated names for the name fields, hence the renames.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "first-name")]
    pub first_name: String,
    #[serde(rename = "last-name")]
    pub last_name: String,
}

/// Form payload for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A single failed check on a book form field, keyed by the form field
/// name so the page can annotate the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Values submitted through the add/edit book form, collected from the
/// multipart body. `document` holds the stored file's media-relative path
/// once the upload part has been written to disk; `None` means no file
/// part arrived.
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub title: String,
    pub summary: String,
    pub pages: String,
    pub document: Option<String>,
    pub category: String,
}

impl BookInput {
    /// Field-level validation applied on both create and update: every
    /// field is required, and the category must be one of the offered
    /// choices. Nothing beyond presence is checked for the text fields;
    /// `pages` in particular stays free text.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError {
                field: "title",
                message: "This field is required.",
            });
        }
        if self.summary.trim().is_empty() {
            errors.push(FieldError {
                field: "summary",
                message: "This field is required.",
            });
        }
        if self.pages.trim().is_empty() {
            errors.push(FieldError {
                field: "pages",
                message: "This field is required.",
            });
        }
        if self.document.is_none() {
            errors.push(FieldError {
                field: "document",
                message: "This field is required.",
            });
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError {
                field: "category",
                message: "This field is required.",
            });
        } else if !CATEGORIES.contains(&self.category.as_str()) {
            errors.push(FieldError {
                field: "category",
                message: "Select a valid category.",
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> BookInput {
        BookInput {
            title: "T".to_string(),
            summary: "S".to_string(),
            pages: "10".to_string(),
            document: Some("pdfs/x.pdf".to_string()),
            category: "Fiction".to_string(),
        }
    }

    #[test]
    fn complete_input_passes() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn every_field_is_required() {
        let empty = BookInput::default();
        let errors = empty.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["title", "summary", "pages", "document", "category"]
        );
    }

    #[test]
    fn category_outside_choices_is_rejected() {
        let mut input = filled();
        input.category = "Other".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "category");
        assert_eq!(errors[0].message, "Select a valid category.");
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut input = filled();
        input.title = "   ".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors[0].field, "title");
    }
}
