//! UI-local state: list cursor, search input, edit and filter forms
//!
//! Nothing here talks to the backend. Forms turn into drafts and filter
//! criteria that the app hands to the renderer.

use crate::commands::{resolve_category, resolve_tags};
use crate::error::AppError;
use crate::filter::FilterCriteria;
use crate::model::{Category, Labels, Prompt, PromptDraft, PromptId, Tag};
use crate::modal::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

/// Main TUI state management
#[derive(Debug, Default)]
pub struct TuiState {
    pub cursor_position: usize,
    pub input_mode: InputMode,
    pub search_input: String,
    pub edit_form: Option<EditForm>,
    pub filter_form: FilterForm,
    pub pending_delete: Option<PromptId>,
    pub view_scroll: u16,
    /// Label of the backend call in flight, shown in the status bar
    pub busy: Option<&'static str>,
    pub should_quit: bool,
}

impl TuiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor_position = 0;
            return;
        }
        let max = len as isize - 1;
        self.cursor_position = (self.cursor_position as isize + delta).clamp(0, max) as usize;
    }

    /// Keep the cursor on a card after the list shrank
    pub fn clamp_cursor(&mut self, len: usize) {
        self.cursor_position = self.cursor_position.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Content,
    Description,
    Category,
    Tags,
}

impl EditField {
    pub const ALL: [EditField; 5] = [
        EditField::Title,
        EditField::Content,
        EditField::Description,
        EditField::Category,
        EditField::Tags,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            EditField::Title => "edit-title",
            EditField::Content => "edit-content",
            EditField::Description => "edit-description",
            EditField::Category => "edit-category",
            EditField::Tags => "edit-tags",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditField::Title => "Title",
            EditField::Content => "Content",
            EditField::Description => "Description",
            EditField::Category => "Category",
            EditField::Tags => "Tags (comma separated)",
        }
    }

    pub fn from_element(id: &ElementId) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.element_id() == id.as_str())
    }

    pub fn multiline(self) -> bool {
        self == EditField::Content
    }
}

/// Text buffers behind the edit modal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditForm {
    /// `None` when creating a prompt
    pub editing: Option<PromptId>,
    pub title: String,
    pub content: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    original: Option<PromptDraft>,
}

impl EditForm {
    pub fn new_prompt() -> Self {
        Self::default()
    }

    /// Prefill from a prompt; names are shown where they resolve, raw ids otherwise
    pub fn from_prompt(prompt: &Prompt, labels: &Labels<'_>) -> Self {
        let tags = prompt
            .tags
            .iter()
            .map(|id| labels.tag_name(id).unwrap_or(id.as_str()).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            editing: Some(prompt.id.clone()),
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            description: prompt.description.clone().unwrap_or_default(),
            category: labels
                .category_name(&prompt.category)
                .unwrap_or(prompt.category.as_str())
                .to_string(),
            tags,
            original: Some(prompt.to_draft()),
        }
    }

    pub fn field_mut(&mut self, field: EditField) -> &mut String {
        match field {
            EditField::Title => &mut self.title,
            EditField::Content => &mut self.content,
            EditField::Description => &mut self.description,
            EditField::Category => &mut self.category,
            EditField::Tags => &mut self.tags,
        }
    }

    pub fn field(&self, field: EditField) -> &str {
        match field {
            EditField::Title => &self.title,
            EditField::Content => &self.content,
            EditField::Description => &self.description,
            EditField::Category => &self.category,
            EditField::Tags => &self.tags,
        }
    }

    pub fn insert_char(&mut self, field: EditField, c: char) {
        self.field_mut(field).push(c);
    }

    pub fn backspace(&mut self, field: EditField) {
        self.field_mut(field).pop();
    }

    /// Build a draft, resolving category and tag names against the library
    ///
    /// Ids that no longer resolve are kept when the prompt already had them.
    pub fn to_draft(&self, categories: &[Category], tags: &[Tag]) -> Result<PromptDraft, AppError> {
        let kept = self.original.as_ref();

        let category_key = self.category.trim();
        let category = if category_key.is_empty() {
            String::new()
        } else if kept.is_some_and(|o| o.category == category_key) {
            category_key.to_string()
        } else {
            resolve_category(categories, category_key)?
        };

        let mut tag_ids = Vec::new();
        for key in self.tags.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            if kept.is_some_and(|o| o.tags.iter().any(|t| t == key)) {
                tag_ids.push(key.to_string());
            } else {
                tag_ids.extend(resolve_tags(tags, &[key.to_string()])?);
            }
        }

        let description = self.description.trim();
        Ok(PromptDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            description: (!description.is_empty()).then(|| description.to_string()),
            category,
            tags: tag_ids,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterRow {
    #[default]
    Category,
    Tag,
}

/// Category/tag pickers in the filter modal. Index 0 means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub row: FilterRow,
    pub category_index: usize,
    pub tag_index: usize,
}

impl FilterForm {
    /// Position the pickers on the current criteria
    pub fn sync(&mut self, criteria: &FilterCriteria, categories: &[Category], tags: &[Tag]) {
        self.category_index = criteria
            .category_id
            .as_ref()
            .and_then(|id| categories.iter().position(|c| &c.id == id))
            .map_or(0, |i| i + 1);
        self.tag_index = criteria
            .tag_name
            .as_ref()
            .and_then(|name| tags.iter().position(|t| &t.name == name || &t.id == name))
            .map_or(0, |i| i + 1);
    }

    pub fn toggle_row(&mut self) {
        self.row = match self.row {
            FilterRow::Category => FilterRow::Tag,
            FilterRow::Tag => FilterRow::Category,
        };
    }

    /// Step the picker on the current row, wrapping through "any"
    pub fn cycle(&mut self, forward: bool, categories: usize, tags: usize) {
        let (index, options) = match self.row {
            FilterRow::Category => (&mut self.category_index, categories + 1),
            FilterRow::Tag => (&mut self.tag_index, tags + 1),
        };
        *index = if forward {
            (*index + 1) % options
        } else {
            (*index + options - 1) % options
        };
    }

    pub fn selected_category<'a>(&self, categories: &'a [Category]) -> Option<&'a Category> {
        self.category_index.checked_sub(1).and_then(|i| categories.get(i))
    }

    pub fn selected_tag<'a>(&self, tags: &'a [Tag]) -> Option<&'a Tag> {
        self.tag_index.checked_sub(1).and_then(|i| tags.get(i))
    }

    /// Criteria for the pickers, keeping the search text
    pub fn criteria(&self, search: &str, categories: &[Category], tags: &[Tag]) -> FilterCriteria {
        FilterCriteria {
            search_query: search.to_string(),
            category_id: self.selected_category(categories).map(|c| c.id.clone()),
            tag_name: self.selected_tag(tags).map(|t| t.name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (Vec<Category>, Vec<Tag>) {
        (
            vec![Category::new("c1", "Coding"), Category::new("c2", "Writing")],
            vec![Tag::new("t1", "rust"), Tag::new("t2", "review")],
        )
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut state = TuiState::new();
        state.move_cursor(-1, 3);
        assert_eq!(state.cursor_position, 0);
        state.move_cursor(10, 3);
        assert_eq!(state.cursor_position, 2);
        state.clamp_cursor(1);
        assert_eq!(state.cursor_position, 0);
        state.move_cursor(1, 0);
        assert_eq!(state.cursor_position, 0);
    }

    #[test]
    fn test_edit_form_prefills_names() {
        let (categories, tags) = library();
        let labels = Labels::new(&categories, &tags);
        let prompt = Prompt::new("p1", "T", "C").with_category("c2").with_tags(["t2", "t9"]);

        let form = EditForm::from_prompt(&prompt, &labels);
        assert_eq!(form.category, "Writing");
        assert_eq!(form.tags, "review, t9");
        assert_eq!(form.editing.as_deref(), Some("p1"));
    }

    #[test]
    fn test_edit_form_keeps_dangling_ids_it_started_with() {
        let (categories, tags) = library();
        let labels = Labels::new(&categories, &tags);
        let prompt = Prompt::new("p1", "T", "C").with_category("c9").with_tags(["t9", "t1"]);

        let form = EditForm::from_prompt(&prompt, &labels);
        let draft = form.to_draft(&categories, &tags).unwrap();
        assert_eq!(draft.category, "c9");
        assert_eq!(draft.tags, vec!["t9", "t1"]);
    }

    #[test]
    fn test_new_form_resolves_names() {
        let (categories, tags) = library();
        let mut form = EditForm::new_prompt();
        for c in "coding".chars() {
            form.insert_char(EditField::Category, c);
        }
        form.tags = "rust, review".to_string();
        form.description = "  ".to_string();

        let draft = form.to_draft(&categories, &tags).unwrap();
        assert_eq!(draft.category, "c1");
        assert_eq!(draft.tags, vec!["t1", "t2"]);
        assert!(draft.description.is_none());

        form.tags = "golang".to_string();
        assert!(form.to_draft(&categories, &tags).is_err());
    }

    #[test]
    fn test_field_ids_round_trip() {
        for field in EditField::ALL {
            assert_eq!(EditField::from_element(&ElementId::from(field.element_id())), Some(field));
        }
        assert_eq!(EditField::from_element(&ElementId::from("edit-save")), None);
    }

    #[test]
    fn test_filter_form_cycles_through_any() {
        let (categories, tags) = library();
        let mut form = FilterForm::default();
        form.cycle(false, categories.len(), tags.len());
        assert_eq!(form.selected_category(&categories).map(|c| c.id.as_str()), Some("c2"));
        form.cycle(true, categories.len(), tags.len());
        assert!(form.selected_category(&categories).is_none());

        form.toggle_row();
        form.cycle(true, categories.len(), tags.len());
        let criteria = form.criteria("lifetimes", &categories, &tags);
        assert_eq!(criteria.tag_name.as_deref(), Some("rust"));
        assert_eq!(criteria.search_query, "lifetimes");
        assert!(criteria.category_id.is_none());

        let mut synced = FilterForm::default();
        synced.sync(&criteria, &categories, &tags);
        assert_eq!(synced.tag_index, 1);
    }
}
