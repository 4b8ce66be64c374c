//! Prompt list rendering and card actions
//!
//! [`PromptListRenderer`] subscribes to the [`AppStore`] and keeps a
//! [`RenderedList`] of prompt cards up to date: every store notification and
//! every change of filter criteria runs the filter engine again. Card actions
//! (view, edit, delete, copy) open modals on the [`ModalStack`] or call the
//! backend through [`PromptApi`].
//!
//! Network-backed actions only touch the store after the awaited call has
//! settled. On failure a toast is shown and the list is left exactly as it
//! was.

use crate::api::PromptApi;
use crate::clipboard::ClipboardSink;
use crate::error::{ApiError, AppError};
use crate::filter::{FilterCriteria, FilterEngine, Paginator};
use crate::logging::log_api_call;
use crate::modal::{ElementId, ModalHost, ModalStack};
use crate::model::{Category, Comment, Labels, Prompt, PromptDraft, PromptResult, Tag};
use crate::notify::{Confirmer, ToastOptions, Toaster, DEFAULT_TOAST_DURATION};
use crate::store::{AppState, AppStore, StatePatch, Subscription};
use crate::validation;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const EXCERPT_CHARS: usize = 160;

/// Element ids of the modals the card actions open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalIds {
    pub view: ElementId,
    pub edit: ElementId,
}

impl Default for ModalIds {
    fn default() -> Self {
        Self {
            view: ElementId::from("prompt-view-modal"),
            edit: ElementId::from("prompt-edit-modal"),
        }
    }
}

/// Display-ready prompt summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub description: Option<String>,
    pub category_label: String,
    pub tag_labels: Vec<String>,
    pub author: Option<String>,
    pub created: Option<String>,
}

impl PromptCard {
    pub fn from_prompt(prompt: &Prompt, labels: &Labels<'_>) -> Self {
        Self {
            id: prompt.id.clone(),
            title: prompt.title.clone(),
            excerpt: excerpt(&prompt.content),
            description: prompt.description.clone(),
            category_label: labels.category_label(&prompt.category),
            tag_labels: prompt.tags.iter().map(|t| labels.tag_label(t)).collect(),
            author: prompt.author.clone(),
            created: prompt
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string()),
        }
    }
}

fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > EXCERPT_CHARS {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        flat
    }
}

fn modal_available<H: ModalHost>(modal: &ElementId, modals: &ModalStack<H>) -> bool {
    let exists = modals.host().exists(modal);
    if !exists {
        warn!(modal = %modal, "Modal element not found; ignoring action");
    }
    exists
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedList {
    pub cards: Vec<PromptCard>,
    pub has_more: bool,
    /// Prompts matching the current criteria
    pub total: usize,
    pub shown_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
    Failed,
}

struct ListView {
    engine: FilterEngine,
    criteria: FilterCriteria,
    paginator: Paginator,
    rendered: RenderedList,
    render_count: u64,
}

impl ListView {
    fn render(&mut self, state: &AppState) {
        let filtered_len = self.engine.filtered_len(
            &state.prompts,
            &state.categories,
            &state.tags,
            &self.criteria,
        );
        self.paginator.clamp(filtered_len);

        let page = self.engine.page(
            &state.prompts,
            &state.categories,
            &state.tags,
            &self.criteria,
            self.paginator.shown_count(),
        );
        let labels = Labels::new(&state.categories, &state.tags);
        self.rendered = RenderedList {
            cards: page
                .visible
                .iter()
                .map(|p| PromptCard::from_prompt(p, &labels))
                .collect(),
            has_more: page.has_more,
            total: page.total,
            shown_count: self.paginator.shown_count(),
        };
        self.render_count += 1;
    }
}

pub struct PromptListRenderer<A: PromptApi, T: Toaster> {
    store: AppStore,
    api: A,
    toaster: T,
    view: Rc<RefCell<ListView>>,
    modal_ids: ModalIds,
    toast_duration: Duration,
    subscription: Subscription,
}

impl<A: PromptApi, T: Toaster> PromptListRenderer<A, T> {
    pub fn new(store: AppStore, api: A, toaster: T, engine: FilterEngine) -> Self {
        let view = Rc::new(RefCell::new(ListView {
            engine,
            criteria: FilterCriteria::default(),
            paginator: Paginator::new(engine.page_size),
            rendered: RenderedList::default(),
            render_count: 0,
        }));

        let listener_view = Rc::clone(&view);
        let subscription = store.subscribe(move |state| {
            listener_view.borrow_mut().render(state);
        });

        Self {
            store,
            api,
            toaster,
            view,
            modal_ids: ModalIds::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
            subscription,
        }
    }

    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn toaster(&self) -> &T {
        &self.toaster
    }

    pub fn modal_ids(&self) -> &ModalIds {
        &self.modal_ids
    }

    pub fn rendered(&self) -> RenderedList {
        self.view.borrow().rendered.clone()
    }

    pub fn render_count(&self) -> u64 {
        self.view.borrow().render_count
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.view.borrow().criteria.clone()
    }

    pub fn shown_count(&self) -> usize {
        self.view.borrow().paginator.shown_count()
    }

    /// Stop reacting to store changes
    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }

    fn rerender(&self) {
        let state = self.store.snapshot();
        self.view.borrow_mut().render(&state);
    }

    fn update_criteria(&self, update: impl FnOnce(&mut FilterCriteria)) {
        {
            let mut view = self.view.borrow_mut();
            let before = view.criteria.clone();
            update(&mut view.criteria);
            if view.criteria == before {
                return;
            }
            view.paginator.reset();
            debug!(criteria = ?view.criteria, "Filter criteria changed");
        }
        self.rerender();
    }

    pub fn set_search(&self, query: &str) {
        self.update_criteria(|c| c.search_query = query.to_string());
    }

    pub fn set_category(&self, category_id: Option<String>) {
        self.update_criteria(|c| c.category_id = category_id);
    }

    pub fn set_tag(&self, tag_name: Option<String>) {
        self.update_criteria(|c| c.tag_name = tag_name);
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.update_criteria(|c| *c = criteria);
    }

    /// Reset every filter and the pagination cursor
    pub fn clear_filters(&self) {
        {
            let mut view = self.view.borrow_mut();
            view.criteria = FilterCriteria::default();
            view.paginator.reset();
        }
        self.rerender();
    }

    /// Reveal the next page. Returns false when nothing more was hidden.
    pub fn load_more(&self) -> bool {
        let state = self.store.snapshot();
        {
            let mut view = self.view.borrow_mut();
            if !view.rendered.has_more {
                return false;
            }
            let filtered_len = view.engine.filtered_len(
                &state.prompts,
                &state.categories,
                &state.tags,
                &view.criteria,
            );
            view.paginator.load_more(filtered_len);
        }
        self.view.borrow_mut().render(&state);
        true
    }

    fn toast_success(&self, message: &str) {
        self.toaster.show_toast(
            message,
            ToastOptions::success().with_duration(self.toast_duration),
        );
    }

    fn toast_error(&self, message: &str) {
        self.toaster.show_toast(
            message,
            ToastOptions::error().with_duration(self.toast_duration),
        );
    }

    fn fail(&self, err: AppError) -> AppError {
        self.toast_error(&err.user_message());
        err
    }

    /// Log a finished backend call and turn its error into a toast
    fn settle<R>(
        &self,
        operation: &str,
        target: Option<&str>,
        started: Instant,
        result: Result<R, ApiError>,
    ) -> Result<R, AppError> {
        let elapsed = started.elapsed().as_millis() as u64;
        log_api_call(operation, target, result.is_ok(), elapsed);
        result.map_err(|e| self.fail(AppError::from(e)))
    }

    fn open_with_prompt<H: ModalHost>(
        &self,
        id: &str,
        modal: &ElementId,
        modals: &mut ModalStack<H>,
    ) -> bool {
        if !modal_available(modal, modals) {
            return false;
        }
        let Some(prompt) = self.store.find_prompt(id) else {
            warn!(prompt_id = id, "Prompt not loaded; ignoring action");
            return false;
        };
        self.store.set_current_prompt(Some(prompt));
        modals.open(modal)
    }

    /// Open the read-only view of a prompt
    pub fn view_prompt<H: ModalHost>(&self, id: &str, modals: &mut ModalStack<H>) -> bool {
        let modal = self.modal_ids.view.clone();
        self.open_with_prompt(id, &modal, modals)
    }

    /// Open the edit form prefilled with a prompt
    pub fn edit_prompt<H: ModalHost>(&self, id: &str, modals: &mut ModalStack<H>) -> bool {
        let modal = self.modal_ids.edit.clone();
        self.open_with_prompt(id, &modal, modals)
    }

    /// Open an empty edit form
    pub fn new_prompt<H: ModalHost>(&self, modals: &mut ModalStack<H>) -> bool {
        if !modal_available(&self.modal_ids.edit, modals) {
            return false;
        }
        self.store.set_current_prompt(None);
        modals.open(&self.modal_ids.edit)
    }

    /// Close the prompt view/edit modals and forget the current prompt
    pub fn close_prompt<H: ModalHost>(&self, modals: &mut ModalStack<H>) {
        modals.close(&self.modal_ids.edit);
        modals.close(&self.modal_ids.view);
        self.store.set_current_prompt(None);
    }

    pub fn copy_prompt(&self, id: &str, clipboard: &mut impl ClipboardSink) -> bool {
        let Some(prompt) = self.store.find_prompt(id) else {
            warn!(prompt_id = id, "Prompt not loaded; nothing to copy");
            return false;
        };
        match clipboard.copy_text(&prompt.content) {
            Ok(()) => {
                self.toast_success(&format!("Copied '{}'", prompt.title));
                true
            }
            Err(e) => {
                self.toast_error(&format!("Copy failed: {}", e));
                false
            }
        }
    }

    /// Load categories, tags and prompts in one go
    pub async fn refresh(&self) -> Result<(), AppError> {
        let started = Instant::now();
        let (categories, tags, prompts) = tokio::join!(
            self.api.fetch_categories(),
            self.api.fetch_tags(),
            self.api.fetch_prompts(),
        );
        let loaded = categories.and_then(|c| tags.and_then(|t| prompts.map(|p| (c, t, p))));
        let (categories, tags, prompts) = self.settle("refresh", None, started, loaded)?;

        let current = self
            .store
            .current_prompt()
            .and_then(|cur| prompts.iter().find(|p| p.id == cur.id).cloned());
        info!(
            prompts = prompts.len(),
            categories = categories.len(),
            tags = tags.len(),
            "Loaded prompt library"
        );
        self.store.apply(StatePatch {
            categories: Some(categories),
            tags: Some(tags),
            prompts: Some(prompts),
            current_prompt: Some(current),
        });
        Ok(())
    }

    pub async fn refresh_prompts(&self) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.api.fetch_prompts().await;
        let prompts = self.settle("fetch_prompts", None, started, result)?;
        self.store.set_prompts(prompts);
        Ok(())
    }

    /// Create (`editing = None`) or update a prompt, then reload the list
    pub async fn save_prompt(
        &self,
        editing: Option<&str>,
        draft: &PromptDraft,
    ) -> Result<(), AppError> {
        validation::validate_draft(draft).map_err(|e| self.fail(e.into()))?;

        let started = Instant::now();
        match editing {
            Some(id) => {
                let result = self.api.update_prompt(id, draft).await;
                self.settle("update_prompt", Some(id), started, result)?;
                self.toast_success(&format!("Updated '{}'", draft.title));
            }
            None => {
                let result = self.api.create_prompt(draft).await;
                let created = self.settle("create_prompt", None, started, result)?;
                self.toast_success(&format!("Created '{}'", created.title));
            }
        }

        // The save went through; a failed reload only leaves the list stale.
        if self.refresh_prompts().await.is_err() {
            warn!("Prompt saved but the list could not be reloaded");
        }
        Ok(())
    }

    /// Ask, then delete. The list changes only if the backend confirms.
    pub async fn delete_prompt(&self, id: &str, confirmer: &impl Confirmer) -> DeleteOutcome {
        let Some(prompt) = self.store.find_prompt(id) else {
            warn!(prompt_id = id, "Prompt not loaded; ignoring delete");
            return DeleteOutcome::Failed;
        };
        let question = format!("Delete '{}'? This cannot be undone.", prompt.title);
        if !confirmer.confirm(&question).await {
            debug!(prompt_id = id, "Delete cancelled");
            return DeleteOutcome::Cancelled;
        }
        self.delete_prompt_confirmed(id).await
    }

    /// Delete without asking; for callers that already collected consent
    pub async fn delete_prompt_confirmed(&self, id: &str) -> DeleteOutcome {
        let started = Instant::now();
        let result = self.api.delete_prompt(id).await;
        if self.settle("delete_prompt", Some(id), started, result).is_err() {
            return DeleteOutcome::Failed;
        }

        let mut prompts = self.store.prompts();
        let title = prompts
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.title.clone())
            .unwrap_or_else(|| id.to_string());
        prompts.retain(|p| p.id != id);

        let clear_current = self
            .store
            .current_prompt()
            .is_some_and(|cur| cur.id == id);
        self.store.apply(StatePatch {
            prompts: Some(prompts),
            current_prompt: clear_current.then_some(None),
            ..StatePatch::default()
        });
        self.toast_success(&format!("Deleted '{}'", title));
        DeleteOutcome::Deleted
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, AppError> {
        validation::validate_tag_name(name).map_err(|e| self.fail(e.into()))?;
        let started = Instant::now();
        let result = self.api.add_tag(name.trim()).await;
        let tag = self.settle("add_tag", Some(name), started, result)?;

        let mut tags = self.store.tags();
        tags.push(tag.clone());
        self.store.set_tags(tags);
        self.toast_success(&format!("Tag '{}' created", tag.name));
        Ok(tag)
    }

    /// Prompts that referenced the tag keep the dangling id.
    pub async fn delete_tag(&self, id: &str, confirmer: &impl Confirmer) -> DeleteOutcome {
        let name = self
            .store
            .tags()
            .into_iter()
            .find(|t| t.id == id)
            .map(|t| t.name)
            .unwrap_or_else(|| id.to_string());
        if !confirmer.confirm(&format!("Delete tag '{}'?", name)).await {
            return DeleteOutcome::Cancelled;
        }

        let started = Instant::now();
        let result = self.api.delete_tag(id).await;
        if self.settle("delete_tag", Some(id), started, result).is_err() {
            return DeleteOutcome::Failed;
        }
        let mut tags = self.store.tags();
        tags.retain(|t| t.id != id);
        self.store.set_tags(tags);
        self.toast_success(&format!("Tag '{}' deleted", name));
        DeleteOutcome::Deleted
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        validation::validate_category_name(name).map_err(|e| self.fail(e.into()))?;
        let started = Instant::now();
        let result = self.api.add_category(name.trim()).await;
        let category = self.settle("add_category", Some(name), started, result)?;

        let mut categories = self.store.categories();
        categories.push(category.clone());
        self.store.set_categories(categories);
        self.toast_success(&format!("Category '{}' created", category.name));
        Ok(category)
    }

    /// Prompts in the category keep the dangling id.
    pub async fn delete_category(&self, id: &str, confirmer: &impl Confirmer) -> DeleteOutcome {
        let name = self
            .store
            .categories()
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.name)
            .unwrap_or_else(|| id.to_string());
        if !confirmer
            .confirm(&format!("Delete category '{}'?", name))
            .await
        {
            return DeleteOutcome::Cancelled;
        }

        let started = Instant::now();
        let result = self.api.delete_category(id).await;
        if self
            .settle("delete_category", Some(id), started, result)
            .is_err()
        {
            return DeleteOutcome::Failed;
        }
        let mut categories = self.store.categories();
        categories.retain(|c| c.id != id);
        self.store.set_categories(categories);
        self.toast_success(&format!("Category '{}' deleted", name));
        DeleteOutcome::Deleted
    }

    pub async fn comments(&self, prompt_id: &str) -> Result<Vec<Comment>, AppError> {
        let started = Instant::now();
        let result = self.api.fetch_comments(prompt_id).await;
        self.settle("fetch_comments", Some(prompt_id), started, result)
    }

    pub async fn add_comment(&self, prompt_id: &str, content: &str) -> Result<Comment, AppError> {
        validation::validate_comment(content).map_err(|e| self.fail(e.into()))?;
        let started = Instant::now();
        let result = self.api.add_comment(prompt_id, content.trim()).await;
        let comment = self.settle("add_comment", Some(prompt_id), started, result)?;
        self.toast_success("Comment added");
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.api.delete_comment(id).await;
        self.settle("delete_comment", Some(id), started, result)?;
        self.toast_success("Comment deleted");
        Ok(())
    }

    pub async fn results(&self, prompt_id: &str) -> Result<Vec<PromptResult>, AppError> {
        let started = Instant::now();
        let result = self.api.fetch_results(prompt_id).await;
        self.settle("fetch_results", Some(prompt_id), started, result)
    }

    pub async fn add_result(&self, prompt_id: &str, content: &str) -> Result<PromptResult, AppError> {
        validation::validate_comment(content).map_err(|e| self.fail(e.into()))?;
        let started = Instant::now();
        let result = self.api.add_result(prompt_id, content.trim()).await;
        let saved = self.settle("add_result", Some(prompt_id), started, result)?;
        self.toast_success("Result saved");
        Ok(saved)
    }

    pub async fn delete_result(&self, id: &str) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.api.delete_result(id).await;
        self.settle("delete_result", Some(id), started, result)?;
        self.toast_success("Result deleted");
        Ok(())
    }
}
