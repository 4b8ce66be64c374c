//! Core records exchanged with the backend
//!
//! Prompts reference categories and tags by id. Those references are allowed
//! to dangle: a prompt keeps pointing at a tag after the tag is deleted, and
//! the UI shows a placeholder label instead of dropping it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Label shown for a prompt whose category no longer exists
pub const DELETED_CATEGORY: &str = "Deleted Category";
/// Label shown for a tag id that no longer resolves
pub const DELETED_TAG: &str = "Deleted Tag";

pub type PromptId = String;
pub type CategoryId = String;
pub type TagId = String;

// The backend sometimes sends numeric ids; keep them as strings everywhere.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(Error::custom(format!("expected string or number id, got {}", other))),
    }
}

// Tags arrive either as an array of ids or as a comma-separated string.
fn deserialize_tag_ids<'de, D>(deserializer: D) -> Result<Vec<TagId>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(Error::custom("expected string or number in tags array")),
            })
            .collect(),
        Value::String(s) => Ok(s
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err(Error::custom("expected array or string for tags")),
    }
}

/// A user-authored prompt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: PromptId,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub category: CategoryId,
    #[serde(default, deserialize_with = "deserialize_tag_ids")]
    pub tags: Vec<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Prompt {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            description: None,
            category: String::new(),
            tags: Vec::new(),
            author: None,
            created_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Editable fields of this prompt, used to prefill the edit form
    pub fn to_draft(&self) -> PromptDraft {
        PromptDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: TagId,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Discussion entry attached to a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub prompt_id: PromptId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Saved output of running a prompt against a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub prompt_id: PromptId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: CategoryId,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Id → name resolution for categories and tags
///
/// Built once per render pass so card labels and the search filter resolve
/// references the same way.
#[derive(Debug, Default)]
pub struct Labels<'a> {
    categories: HashMap<&'a str, &'a str>,
    tags: HashMap<&'a str, &'a str>,
}

impl<'a> Labels<'a> {
    pub fn new(categories: &'a [Category], tags: &'a [Tag]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| (c.id.as_str(), c.name.as_str()))
                .collect(),
            tags: tags.iter().map(|t| (t.id.as_str(), t.name.as_str())).collect(),
        }
    }

    pub fn category_name(&self, id: &str) -> Option<&'a str> {
        self.categories.get(id).copied()
    }

    pub fn tag_name(&self, id: &str) -> Option<&'a str> {
        self.tags.get(id).copied()
    }

    /// Display label for a category reference, with the deleted placeholder
    pub fn category_label(&self, id: &str) -> String {
        self.category_name(id).unwrap_or(DELETED_CATEGORY).to_string()
    }

    /// Display label for a tag reference, with the deleted placeholder
    pub fn tag_label(&self, id: &str) -> String {
        self.tag_name(id).unwrap_or(DELETED_TAG).to_string()
    }
}
