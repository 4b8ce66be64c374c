//! Client-side filtering and paging of the prompt list
//!
//! Everything here is pure: the same prompts, lookups, criteria and cursor
//! always produce the same page. Filtering never reorders; prompts keep the
//! order the backend returned them in.

use crate::model::{Category, Labels, Prompt, Tag};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// How the tag filter compares against a prompt's tag references
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMatch {
    /// Resolved tag name first, raw tag id as fallback
    #[default]
    NameOrId,
    /// Raw tag id only
    IdOnly,
}

/// Active filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_query: String,
    pub category_id: Option<String>,
    pub tag_name: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_tag(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_query.trim().is_empty() && self.category_id.is_none() && self.tag_name.is_none()
    }
}

/// One page of filtered prompts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub visible: Vec<Prompt>,
    pub has_more: bool,
    /// Number of prompts that passed the filter
    pub total: usize,
}

fn matches_search(prompt: &Prompt, needle: &str, labels: &Labels<'_>) -> bool {
    if needle.is_empty() {
        return true;
    }
    if prompt.title.to_lowercase().contains(needle) || prompt.content.to_lowercase().contains(needle)
    {
        return true;
    }
    if let Some(name) = labels.category_name(&prompt.category) {
        if name.to_lowercase().contains(needle) {
            return true;
        }
    }
    prompt
        .tags
        .iter()
        .filter_map(|id| labels.tag_name(id))
        .any(|name| name.to_lowercase().contains(needle))
}

fn matches_tag(prompt: &Prompt, tag: &str, labels: &Labels<'_>, mode: TagMatch) -> bool {
    prompt.tags.iter().any(|id| match mode {
        TagMatch::NameOrId => labels.tag_name(id) == Some(tag) || id == tag,
        TagMatch::IdOnly => id == tag,
    })
}

/// Prompts that pass every active criterion, in their original order
pub fn filter_prompts<'a>(
    prompts: &'a [Prompt],
    categories: &[Category],
    tags: &[Tag],
    criteria: &FilterCriteria,
    mode: TagMatch,
) -> Vec<&'a Prompt> {
    let labels = Labels::new(categories, tags);
    let needle = criteria.search_query.trim().to_lowercase();

    prompts
        .iter()
        .filter(|p| matches_search(p, &needle, &labels))
        .filter(|p| match &criteria.category_id {
            Some(category) => &p.category == category,
            None => true,
        })
        .filter(|p| match &criteria.tag_name {
            Some(tag) => matches_tag(p, tag, &labels, mode),
            None => true,
        })
        .collect()
}

/// First `shown_count + page_size` entries of an already filtered list
pub fn paginate(filtered: &[&Prompt], shown_count: usize, page_size: usize) -> Page {
    let end = shown_count.saturating_add(page_size).min(filtered.len());
    Page {
        visible: filtered[..end].iter().map(|p| (*p).clone()).collect(),
        has_more: filtered.len() > shown_count.saturating_add(page_size),
        total: filtered.len(),
    }
}

/// "Load more" cursor over a filtered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    shown_count: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            shown_count: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn shown_count(&self) -> usize {
        self.shown_count
    }

    /// Advance by one page, never past the filtered length
    pub fn load_more(&mut self, filtered_len: usize) {
        self.shown_count = (self.shown_count + self.page_size).min(filtered_len);
    }

    pub fn reset(&mut self) {
        self.shown_count = 0;
    }

    /// Keep the cursor within bounds after the list shrank
    pub fn clamp(&mut self, filtered_len: usize) {
        self.shown_count = self.shown_count.min(filtered_len);
    }
}

/// Filter + paginate in one call with fixed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEngine {
    pub page_size: usize,
    pub tag_match: TagMatch,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            tag_match: TagMatch::default(),
        }
    }
}

impl FilterEngine {
    pub fn new(page_size: usize, tag_match: TagMatch) -> Self {
        Self {
            page_size: page_size.max(1),
            tag_match,
        }
    }

    pub fn filtered_len(
        &self,
        prompts: &[Prompt],
        categories: &[Category],
        tags: &[Tag],
        criteria: &FilterCriteria,
    ) -> usize {
        filter_prompts(prompts, categories, tags, criteria, self.tag_match).len()
    }

    pub fn page(
        &self,
        prompts: &[Prompt],
        categories: &[Category],
        tags: &[Tag],
        criteria: &FilterCriteria,
        shown_count: usize,
    ) -> Page {
        let filtered = filter_prompts(prompts, categories, tags, criteria, self.tag_match);
        paginate(&filtered, shown_count, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<Prompt>, Vec<Category>, Vec<Tag>) {
        let categories = vec![Category::new("c1", "Coding"), Category::new("c2", "Writing")];
        let tags = vec![Tag::new("t1", "rust"), Tag::new("t2", "review")];
        let prompts = vec![
            Prompt::new("p1", "Borrow checker help", "Explain this lifetime error")
                .with_category("c1")
                .with_tags(["t1"]),
            Prompt::new("p2", "Blog outline", "Outline a post about lifetimes")
                .with_category("c2")
                .with_tags(["t2"]),
            Prompt::new("p3", "Code review", "Review the following diff")
                .with_category("c1")
                .with_tags(["t1", "t2"]),
            Prompt::new("p4", "Orphan", "References nothing that exists")
                .with_category("c9")
                .with_tags(["t9"]),
        ];
        (prompts, categories, tags)
    }

    fn ids(prompts: &[&Prompt]) -> Vec<String> {
        prompts.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_empty_criteria_matches_everything_in_order() {
        let (prompts, categories, tags) = fixture();
        let out = filter_prompts(&prompts, &categories, &tags, &FilterCriteria::new(), TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let (prompts, categories, tags) = fixture();
        let criteria = FilterCriteria::new().with_search("LIFETIME");
        let out = filter_prompts(&prompts, &categories, &tags, &criteria, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p1", "p2"]);
    }

    #[test]
    fn test_search_uses_resolved_names_not_ids() {
        let (prompts, categories, tags) = fixture();

        let by_category_name = FilterCriteria::new().with_search("writing");
        let out = filter_prompts(&prompts, &categories, &tags, &by_category_name, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p2"]);

        let by_tag_name = FilterCriteria::new().with_search("rust");
        let out = filter_prompts(&prompts, &categories, &tags, &by_tag_name, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p1", "p3"]);

        let by_raw_id = FilterCriteria::new().with_search("t9");
        let out = filter_prompts(&prompts, &categories, &tags, &by_raw_id, TagMatch::NameOrId);
        assert!(out.is_empty());
    }

    #[test]
    fn test_filters_compose_with_and() {
        let (prompts, categories, tags) = fixture();

        let search_only = FilterCriteria::new().with_search("outline");
        let out = filter_prompts(&prompts, &categories, &tags, &search_only, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p2"]);

        let both = search_only.clone().with_category("c1");
        let out = filter_prompts(&prompts, &categories, &tags, &both, TagMatch::NameOrId);
        assert!(out.is_empty());

        let all_three = FilterCriteria::new()
            .with_search("review")
            .with_category("c1")
            .with_tag("rust");
        let out = filter_prompts(&prompts, &categories, &tags, &all_three, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p3"]);
    }

    #[test]
    fn test_tag_filter_by_name_with_id_fallback() {
        let (prompts, categories, tags) = fixture();

        let by_name = FilterCriteria::new().with_tag("review");
        let out = filter_prompts(&prompts, &categories, &tags, &by_name, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p2", "p3"]);

        let by_dangling_id = FilterCriteria::new().with_tag("t9");
        let out = filter_prompts(&prompts, &categories, &tags, &by_dangling_id, TagMatch::NameOrId);
        assert_eq!(ids(&out), vec!["p4"]);

        let out = filter_prompts(&prompts, &categories, &tags, &by_name, TagMatch::IdOnly);
        assert!(out.is_empty());
        let by_id = FilterCriteria::new().with_tag("t2");
        let out = filter_prompts(&prompts, &categories, &tags, &by_id, TagMatch::IdOnly);
        assert_eq!(ids(&out), vec!["p2", "p3"]);
    }

    #[test]
    fn test_unmatched_filter_yields_empty_page() {
        let (prompts, categories, tags) = fixture();
        let engine = FilterEngine::default();
        let page = engine.page(&prompts, &categories, &tags, &FilterCriteria::new().with_tag("python"), 0);
        assert!(page.visible.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_filter_is_deterministic() {
        let (prompts, categories, tags) = fixture();
        let engine = FilterEngine::new(2, TagMatch::NameOrId);
        let criteria = FilterCriteria::new().with_search("e");
        let first = engine.page(&prompts, &categories, &tags, &criteria, 0);
        for _ in 0..10 {
            assert_eq!(engine.page(&prompts, &categories, &tags, &criteria, 0), first);
        }
    }

    #[test]
    fn test_dangling_category_still_filters_by_id() {
        let prompts = vec![Prompt::new("p1", "T", "C").with_category("c1").with_tags(["t1"])];
        let engine = FilterEngine::default();
        let page = engine.page(&prompts, &[], &[], &FilterCriteria::new().with_category("c1"), 0);
        assert_eq!(page.visible.len(), 1);
        assert_eq!(page.visible[0].id, "p1");
    }

    #[test]
    fn test_empty_store_yields_empty_page() {
        let engine = FilterEngine::default();
        let page = engine.page(&[], &[], &[], &FilterCriteria::new(), 0);
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_pages_of_twenty_over_twenty_five() {
        let prompts: Vec<Prompt> = (0..25)
            .map(|i| Prompt::new(format!("p{}", i), format!("Prompt {}", i), "body"))
            .collect();
        let engine = FilterEngine::new(20, TagMatch::NameOrId);
        let criteria = FilterCriteria::new();
        let mut pager = Paginator::new(engine.page_size);

        let first = engine.page(&prompts, &[], &[], &criteria, pager.shown_count());
        assert_eq!(first.visible.len(), 20);
        assert!(first.has_more);

        pager.load_more(engine.filtered_len(&prompts, &[], &[], &criteria));
        let second = engine.page(&prompts, &[], &[], &criteria, pager.shown_count());
        assert_eq!(second.visible.len(), 25);
        assert!(!second.has_more);
        assert_eq!(second.visible[24].id, "p24");
    }

    #[test]
    fn test_load_more_is_monotonic_and_clamped() {
        let filtered_len = 47;
        let mut pager = Paginator::new(10);
        for n in 1..=8 {
            let before = pager.shown_count();
            pager.load_more(filtered_len);
            assert!(pager.shown_count() >= before);
            assert_eq!(pager.shown_count(), (n * 10).min(filtered_len));
        }
        pager.reset();
        assert_eq!(pager.shown_count(), 0);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        assert_eq!(Paginator::new(0).page_size(), 1);
        assert_eq!(FilterEngine::new(0, TagMatch::IdOnly).page_size, 1);
    }
}
