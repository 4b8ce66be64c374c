//! Input checks run before anything is sent to the backend

use crate::error::ValidationError;
use crate::model::PromptDraft;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 64;

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        Err(ValidationError::TooLong { field, len, max })
    } else {
        Ok(())
    }
}

/// Tag names are stored comma-joined by the backend, so commas are refused.
/// Existing tags are never re-checked.
pub fn validate_tag_name(name: &str) -> Result<(), ValidationError> {
    required("tag name", name)?;
    if name.contains(',') {
        return Err(ValidationError::CommaInTagName(name.to_string()));
    }
    bounded("tag name", name.trim(), MAX_NAME_LEN)
}

pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    required("category name", name)?;
    bounded("category name", name.trim(), MAX_NAME_LEN)
}

pub fn validate_draft(draft: &PromptDraft) -> Result<(), ValidationError> {
    required("title", &draft.title)?;
    bounded("title", &draft.title, MAX_TITLE_LEN)?;
    required("content", &draft.content)?;
    required("category", &draft.category)
}

pub fn validate_comment(content: &str) -> Result<(), ValidationError> {
    required("comment", content)
}
