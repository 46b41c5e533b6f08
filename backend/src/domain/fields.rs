//! Field validation shared by catalogue drafts.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and hyphens. Names and labels only need to be non-blank.

use thiserror::Error;

/// Validation failures raised while building entity drafts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The named field is empty once trimmed of whitespace.
    #[error("{field} must not be blank")]
    Blank {
        /// Payload field that failed validation.
        field: &'static str,
    },
    /// The slug contains characters outside `[a-z0-9-]` or surrounding
    /// whitespace.
    #[error("slug `{value}` may only contain lowercase letters, digits, and hyphens")]
    InvalidSlug {
        /// Rejected slug value.
        value: String,
    },
}

/// Return `value` unchanged when it has visible content.
pub(crate) fn require_non_blank(field: &'static str, value: String) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Blank { field });
    }
    Ok(value)
}

/// Return `value` unchanged when it is a valid slug.
pub(crate) fn require_slug(value: String) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::Blank { field: "slug" });
    }
    if !is_valid_slug(&value) {
        return Err(FieldError::InvalidSlug { value });
    }
    Ok(value)
}

fn is_valid_slug(value: &str) -> bool {
    value.trim() == value
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("fold")]
    #[case::hyphenated("fold-sync-2")]
    fn accepts_valid_slugs(#[case] slug: &str) {
        assert_eq!(require_slug(slug.to_owned()).as_deref(), Ok(slug));
    }

    #[rstest]
    #[case::uppercase("Fold")]
    #[case::spaces("fold sync")]
    #[case::padded(" fold")]
    #[case::underscore("fold_sync")]
    fn rejects_invalid_slugs(#[case] slug: &str) {
        assert!(matches!(
            require_slug(slug.to_owned()),
            Err(FieldError::InvalidSlug { .. })
        ));
    }

    #[rstest]
    fn blank_names_report_the_field() {
        let err = require_non_blank("name", "   ".to_owned()).expect_err("blank rejected");
        assert_eq!(err.to_string(), "name must not be blank");
    }
}
