//! Handlers behind the `pdesk` subcommands
//!
//! Each handler loads what it needs through a [`PromptListRenderer`] and
//! writes its report to the given writer. Backend failures are already shown
//! as toasts by the renderer when a handler returns them.

pub mod configuration;
pub mod core;
pub mod feedback;
pub mod library;

pub use configuration::handle_config;
pub use core::{handle_copy, handle_delete, handle_edit, handle_list, handle_new, handle_show};
pub use feedback::{handle_feedback, FeedbackKind};
pub use library::{handle_names, NameKind};

use crate::error::AppError;
use crate::model::{Category, Tag};

/// Accept a category id, or a name compared case-insensitively
pub fn resolve_category(categories: &[Category], key: &str) -> Result<String, AppError> {
    let key = key.trim();
    categories
        .iter()
        .find(|c| c.id == key)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
        .map(|c| c.id.clone())
        .ok_or_else(|| AppError::not_found("category", key))
}

pub fn resolve_tags(tags: &[Tag], keys: &[String]) -> Result<Vec<String>, AppError> {
    keys.iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|key| {
            tags.iter()
                .find(|t| t.id == key)
                .or_else(|| tags.iter().find(|t| t.name.eq_ignore_ascii_case(key)))
                .map(|t| t.id.clone())
                .ok_or_else(|| AppError::not_found("tag", key))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_id_or_name() {
        let categories = vec![Category::new("c1", "Coding")];
        assert_eq!(resolve_category(&categories, "c1").unwrap(), "c1");
        assert_eq!(resolve_category(&categories, " coding ").unwrap(), "c1");
        assert!(matches!(
            resolve_category(&categories, "Cooking"),
            Err(AppError::NotFound { kind: "category", .. })
        ));

        let tags = vec![Tag::new("t1", "rust"), Tag::new("t2", "Review")];
        let keys = vec!["review".to_string(), "t1".to_string(), " ".to_string()];
        assert_eq!(resolve_tags(&tags, &keys).unwrap(), vec!["t2", "t1"]);
        assert!(resolve_tags(&tags, &["go".to_string()]).is_err());
    }
}
