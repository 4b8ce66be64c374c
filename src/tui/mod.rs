//! Interactive terminal UI
//!
//! The prompt list, search bar and filter chips sit on the page. View, edit,
//! filter, confirm and help dialogs are modals managed by a [`ModalStack`]
//! over a [`VirtualDocument`]; stacked dialogs stay visible but dimmed, and
//! Esc/Tab go to the stack first.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io, time::Duration};
use tracing::{debug, info};

use crate::api::PromptApi;
use crate::clipboard::ClipboardSink;
use crate::config::Settings;
use crate::filter::FilterEngine;
use crate::model::{Labels, PromptId};
use crate::modal::{ElementId, ModalHost, ModalKey, ModalStack, VirtualDocument};
use crate::notify::{ToastKind, ToastOptions, ToastQueue, Toaster};
use crate::renderer::{DeleteOutcome, ModalIds, PromptListRenderer};
use crate::store::AppStore;

pub mod state;

pub use state::*;

const SEARCH_INPUT: &str = "search-input";
const PROMPT_LIST: &str = "prompt-list";
const FILTER_MODAL: &str = "filter-modal";
const CONFIRM_MODAL: &str = "confirm-modal";
const HELP_MODAL: &str = "help-modal";
const EDIT_SAVE: &str = "edit-save";
const EDIT_CLOSE: &str = "edit-close";

/// Work the event loop has to await after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    Save,
    Delete(PromptId),
}

impl Action {
    fn busy_label(&self) -> Option<&'static str> {
        match self {
            Action::Refresh => Some("Loading"),
            Action::Save => Some("Saving"),
            Action::Delete(_) => Some("Deleting"),
            Action::None | Action::Quit => None,
        }
    }
}

/// Page elements and dialogs the modal stack manages
pub fn build_document(ids: &ModalIds) -> VirtualDocument {
    let mut doc = VirtualDocument::new();
    doc.add_focusable(SEARCH_INPUT, None);
    doc.add_focusable(PROMPT_LIST, None);

    let view = ids.view.as_str();
    doc.add_modal(view);
    doc.add_focusable("view-body", Some(view));
    doc.add_close_control(view, "view-close");

    let edit = ids.edit.as_str();
    doc.add_modal(edit);
    for field in EditField::ALL {
        doc.add_focusable(field.element_id(), Some(edit));
    }
    doc.add_focusable(EDIT_SAVE, Some(edit));
    doc.add_close_control(edit, EDIT_CLOSE);

    doc.add_modal(FILTER_MODAL);
    doc.add_focusable("filter-category", Some(FILTER_MODAL));
    doc.add_focusable("filter-tag", Some(FILTER_MODAL));
    doc.add_close_control(FILTER_MODAL, "filter-close");

    doc.add_modal(CONFIRM_MODAL);
    doc.add_focusable("confirm-yes", Some(CONFIRM_MODAL));
    doc.add_close_control(CONFIRM_MODAL, "confirm-no");

    doc.add_modal(HELP_MODAL);
    doc.add_close_control(HELP_MODAL, "help-close");
    doc
}

pub struct PromptDeskTui<A: PromptApi, C: ClipboardSink> {
    renderer: PromptListRenderer<A, ToastQueue>,
    modals: ModalStack<VirtualDocument>,
    state: TuiState,
    toasts: ToastQueue,
    clipboard: C,
}

impl<A: PromptApi, C: ClipboardSink> PromptDeskTui<A, C> {
    pub fn new(api: A, clipboard: C, settings: &Settings) -> Self {
        let toasts = ToastQueue::new();
        let engine = FilterEngine::new(settings.page_size, settings.tag_match);
        let renderer = PromptListRenderer::new(AppStore::new(), api, toasts.clone(), engine)
            .with_toast_duration(settings.toast_duration());

        let mut modals = ModalStack::new(build_document(renderer.modal_ids()));
        modals.host_mut().focus(&ElementId::from(PROMPT_LIST));

        Self {
            renderer,
            modals,
            state: TuiState::new(),
            toasts,
            clipboard,
        }
    }

    pub fn renderer(&self) -> &PromptListRenderer<A, ToastQueue> {
        &self.renderer
    }

    pub fn modals(&self) -> &ModalStack<VirtualDocument> {
        &self.modals
    }

    pub fn state(&self) -> &TuiState {
        &self.state
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub async fn run(mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_app(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.dispatch(terminal, Action::Refresh).await?;

        loop {
            terminal.draw(|f| self.ui(f))?;
            if self.state.should_quit {
                info!("Leaving UI");
                return Ok(());
            }

            // Poll so expired toasts disappear without a key press
            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                let action = self.handle_key(key);
                self.dispatch(terminal, action).await?;
            }
        }
    }

    async fn dispatch<B: Backend>(&mut self, terminal: &mut Terminal<B>, action: Action) -> Result<()> {
        if let Some(label) = action.busy_label() {
            self.state.busy = Some(label);
            terminal.draw(|f| self.ui(f))?;
        }
        self.perform(action).await;
        self.state.busy = None;
        Ok(())
    }

    /// Carry out an action produced by [`handle_key`](Self::handle_key)
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.state.should_quit = true,
            Action::Refresh => {
                if self.renderer.refresh().await.is_err() {
                    debug!("Refresh failed; keeping what is loaded");
                }
            }
            Action::Save => self.save_form().await,
            Action::Delete(id) => {
                if self.renderer.delete_prompt_confirmed(&id).await == DeleteOutcome::Deleted {
                    self.renderer.close_prompt(&mut self.modals);
                    self.after_close();
                }
            }
        }
        let len = self.renderer.rendered().cards.len();
        self.state.clamp_cursor(len);
    }

    async fn save_form(&mut self) {
        let Some(form) = self.state.edit_form.clone() else {
            return;
        };
        let store = self.renderer.store();
        let draft = match form.to_draft(&store.categories(), &store.tags()) {
            Ok(draft) => draft,
            Err(e) => {
                self.toasts.show_toast(&e.user_message(), ToastOptions::error());
                return;
            }
        };
        if self
            .renderer
            .save_prompt(form.editing.as_deref(), &draft)
            .await
            .is_ok()
        {
            self.renderer.close_prompt(&mut self.modals);
            self.after_close();
        }
    }

    /// Route a key press; anything needing the backend comes back as an [`Action`]
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        if let Some(active) = self.modals.active().cloned() {
            return self.handle_modal_key(&active, key);
        }
        match self.state.input_mode {
            InputMode::Search => {
                self.handle_search_key(key);
                Action::None
            }
            InputMode::Normal => self.handle_list_key(key),
        }
    }

    fn selected_id(&self) -> Option<PromptId> {
        self.renderer
            .rendered()
            .cards
            .get(self.state.cursor_position)
            .map(|c| c.id.clone())
    }

    fn current_id(&self) -> Option<PromptId> {
        self.renderer.store().current_prompt().map(|p| p.id)
    }

    fn focus(&mut self, id: &str) {
        self.modals.host_mut().focus(&ElementId::from(id));
    }

    fn open_edit(&mut self, id: &str) {
        let state = self.renderer.store().snapshot();
        let Some(prompt) = state.prompts.iter().find(|p| p.id == id) else {
            return;
        };
        let labels = Labels::new(&state.categories, &state.tags);
        let form = EditForm::from_prompt(prompt, &labels);
        if self.renderer.edit_prompt(id, &mut self.modals) {
            self.state.edit_form = Some(form);
        }
    }

    fn request_delete(&mut self, id: PromptId) {
        self.state.pending_delete = Some(id);
        self.modals.open(&ElementId::from(CONFIRM_MODAL));
    }

    fn copy(&mut self, id: &str) {
        self.renderer.copy_prompt(id, &mut self.clipboard);
    }

    /// Drop form state belonging to dialogs that are gone
    fn after_close(&mut self) {
        let ids = self.renderer.modal_ids().clone();
        if !self.modals.contains(&ids.edit) {
            self.state.edit_form = None;
        }
        if !self.modals.contains(&ElementId::from(CONFIRM_MODAL)) {
            self.state.pending_delete = None;
        }
        let prompt_open = self.modals.contains(&ids.view) || self.modals.contains(&ids.edit);
        if !prompt_open && self.renderer.store().current_prompt().is_some() {
            self.renderer.store().set_current_prompt(None);
        }
        if !prompt_open {
            self.state.view_scroll = 0;
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Action {
        let len = self.renderer.rendered().cards.len();
        self.focus(PROMPT_LIST);

        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Down | KeyCode::Char('j') => self.state.move_cursor(1, len),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_cursor(-1, len),
            KeyCode::Home | KeyCode::Char('g') => self.state.cursor_position = 0,
            KeyCode::End | KeyCode::Char('G') => self.state.move_cursor(len as isize, len),
            KeyCode::Enter | KeyCode::Char('v') => {
                if let Some(id) = self.selected_id() {
                    self.renderer.view_prompt(&id, &mut self.modals);
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    self.open_edit(&id);
                }
            }
            KeyCode::Char('n') => {
                if self.renderer.new_prompt(&mut self.modals) {
                    self.state.edit_form = Some(EditForm::new_prompt());
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.request_delete(id);
                }
            }
            KeyCode::Char('c') => {
                if let Some(id) = self.selected_id() {
                    self.copy(&id);
                }
            }
            KeyCode::Char('/') => {
                self.state.input_mode = InputMode::Search;
                self.focus(SEARCH_INPUT);
            }
            KeyCode::Char('f') => {
                let store = self.renderer.store();
                self.state.filter_form.sync(
                    &self.renderer.criteria(),
                    &store.categories(),
                    &store.tags(),
                );
                self.modals.open(&ElementId::from(FILTER_MODAL));
            }
            KeyCode::Char('m') => {
                if !self.renderer.load_more() {
                    self.toasts
                        .show_toast("No more prompts to load", ToastOptions::info());
                }
            }
            KeyCode::Char('x') | KeyCode::Esc => {
                self.state.search_input.clear();
                self.renderer.clear_filters();
                self.state.cursor_position = 0;
            }
            KeyCode::Char('?') => {
                self.modals.open(&ElementId::from(HELP_MODAL));
            }
            _ => {}
        }
        Action::None
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.state.search_input.push(c);
            }
            KeyCode::Backspace => {
                self.state.search_input.pop();
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Down => {
                self.state.input_mode = InputMode::Normal;
                self.focus(PROMPT_LIST);
                return;
            }
            _ => return,
        }
        self.renderer.set_search(&self.state.search_input);
        self.state.cursor_position = 0;
    }

    fn handle_modal_key(&mut self, active: &ElementId, key: KeyEvent) -> Action {
        let routed = match key.code {
            KeyCode::Esc => Some(ModalKey::Escape),
            KeyCode::Tab => Some(ModalKey::Tab),
            KeyCode::BackTab => Some(ModalKey::BackTab),
            _ => None,
        };
        if let Some(modal_key) = routed {
            self.modals.handle_key(modal_key);
            self.after_close();
            return Action::None;
        }

        let ids = self.renderer.modal_ids().clone();
        match active.as_str() {
            HELP_MODAL => {
                self.modals.close_active();
            }
            CONFIRM_MODAL => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    let pending = self.state.pending_delete.take();
                    self.modals.close_active();
                    self.after_close();
                    if let Some(id) = pending {
                        return Action::Delete(id);
                    }
                }
                KeyCode::Char('n') => {
                    self.modals.close_active();
                    self.after_close();
                }
                _ => {}
            },
            FILTER_MODAL => self.handle_filter_key(key),
            id if id == ids.view.as_str() => {
                let Some(current) = self.current_id() else {
                    return Action::None;
                };
                match key.code {
                    KeyCode::Char('e') => self.open_edit(&current),
                    KeyCode::Char('d') => self.request_delete(current),
                    KeyCode::Char('c') => self.copy(&current),
                    KeyCode::Char('?') => {
                        self.modals.open(&ElementId::from(HELP_MODAL));
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.state.view_scroll = self.state.view_scroll.saturating_add(1)
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.state.view_scroll = self.state.view_scroll.saturating_sub(1)
                    }
                    _ => {}
                }
            }
            id if id == ids.edit.as_str() => return self.handle_edit_key(key),
            _ => {}
        }
        Action::None
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return Action::Save;
        }
        let focused = self.modals.host().focused();
        match focused.as_ref().map(|f| f.as_str()) {
            Some(EDIT_SAVE) if key.code == KeyCode::Enter => return Action::Save,
            Some(EDIT_CLOSE) if key.code == KeyCode::Enter => {
                self.modals.close_active();
                self.after_close();
                return Action::None;
            }
            _ => {}
        }

        let Some(field) = focused.as_ref().and_then(EditField::from_element) else {
            return Action::None;
        };
        let Some(form) = self.state.edit_form.as_mut() else {
            return Action::None;
        };
        match key.code {
            KeyCode::Char(c) => form.insert_char(field, c),
            KeyCode::Backspace => form.backspace(field),
            KeyCode::Enter if field.multiline() => form.insert_char(field, '\n'),
            KeyCode::Enter => {
                self.modals.handle_key(ModalKey::Tab);
            }
            _ => {}
        }
        Action::None
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let store = self.renderer.store();
        let categories = store.categories();
        let tags = store.tags();
        let form = &mut self.state.filter_form;

        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') => {
                form.toggle_row();
                let element = match form.row {
                    FilterRow::Category => "filter-category",
                    FilterRow::Tag => "filter-tag",
                };
                self.modals.host_mut().focus(&ElementId::from(element));
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                form.cycle(true, categories.len(), tags.len())
            }
            KeyCode::Left | KeyCode::Char('h') => form.cycle(false, categories.len(), tags.len()),
            KeyCode::Enter => {
                let criteria = form.criteria(&self.state.search_input, &categories, &tags);
                self.renderer.set_criteria(criteria);
                self.state.cursor_position = 0;
                self.modals.close_active();
            }
            KeyCode::Char('c') => {
                self.state.filter_form = FilterForm::default();
                let criteria = self
                    .state
                    .filter_form
                    .criteria(&self.state.search_input, &categories, &tags);
                self.renderer.set_criteria(criteria);
                self.state.cursor_position = 0;
                self.modals.close_active();
            }
            _ => {}
        }
    }

    fn ui(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.draw_search_bar(f, chunks[0]);
        self.draw_filter_chips(f, chunks[1]);
        self.draw_prompt_list(f, chunks[2]);
        self.draw_status_bar(f, chunks[3]);

        // Bottom of the stack first so the active dialog ends up on top
        let host = self.modals.host();
        let mut open: Vec<(ElementId, u32, bool)> = self
            .modals
            .modals()
            .filter_map(|m| {
                host.presentation(m)
                    .filter(|p| p.visible)
                    .map(|p| (m.clone(), p.z_index.unwrap_or(0), p.inert))
            })
            .collect();
        open.sort_by_key(|(_, z, _)| *z);
        for (modal, _, dimmed) in open {
            self.draw_modal(f, &modal, dimmed);
        }
    }

    fn draw_search_bar(&self, f: &mut Frame, area: Rect) {
        let searching = self.state.input_mode == InputMode::Search;
        let border = if searching { Color::Yellow } else { Color::DarkGray };
        let text = if self.state.search_input.is_empty() && !searching {
            Span::styled("Press / to search", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(format!("{}{}", self.state.search_input, if searching { "▏" } else { "" }))
        };
        let paragraph = Paragraph::new(Line::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search ")
                .border_style(Style::default().fg(border)),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_filter_chips(&self, f: &mut Frame, area: Rect) {
        let criteria = self.renderer.criteria();
        let state = self.renderer.store().snapshot();
        let labels = Labels::new(&state.categories, &state.tags);
        let chip = Style::default().fg(Color::Black).bg(Color::Cyan);

        let mut spans = vec![Span::raw(" ")];
        if let Some(category) = &criteria.category_id {
            spans.push(Span::styled(format!(" {} ", labels.category_label(category)), chip));
            spans.push(Span::raw(" "));
        }
        if let Some(tag) = &criteria.tag_name {
            spans.push(Span::styled(format!(" #{} ", tag), chip));
            spans.push(Span::raw(" "));
        }
        if criteria.is_empty() {
            spans.push(Span::styled("No filters · f to filter", Style::default().fg(Color::DarkGray)));
        } else {
            spans.push(Span::styled("x to clear", Style::default().fg(Color::DarkGray)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_prompt_list(&self, f: &mut Frame, area: Rect) {
        let list = self.renderer.rendered();
        let items: Vec<ListItem> = list
            .cards
            .iter()
            .map(|card| {
                let mut header = vec![
                    Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(format!("[{}]", card.category_label), Style::default().fg(Color::Cyan)),
                ];
                for tag in &card.tag_labels {
                    header.push(Span::styled(format!(" #{}", tag), Style::default().fg(Color::Yellow)));
                }
                ListItem::new(vec![
                    Line::from(header),
                    Line::from(Span::styled(
                        format!("  {}", card.excerpt),
                        Style::default().fg(Color::Gray),
                    )),
                ])
            })
            .collect();

        let more = if list.has_more { " · m for more" } else { "" };
        let title = format!(" Prompts {} of {}{} ", list.cards.len(), list.total, more);
        let widget = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(45, 50, 59))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        if !list.cards.is_empty() {
            list_state.select(Some(self.state.cursor_position));
        }
        f.render_stateful_widget(widget, area, &mut list_state);
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let line = if let Some(label) = self.state.busy {
            Line::from(Span::styled(format!(" {}…", label), Style::default().fg(Color::Yellow)))
        } else if let Some(toast) = self.toasts.current() {
            let color = match toast.kind {
                ToastKind::Success => Color::Green,
                ToastKind::Error => Color::Red,
                ToastKind::Warning => Color::Yellow,
                ToastKind::Info => Color::Blue,
            };
            Line::from(Span::styled(format!(" {}", toast.message), Style::default().fg(color)))
        } else {
            Line::from(Span::styled(
                " ↑↓ move · Enter view · e edit · n new · d delete · c copy · / search · f filter · ? help · q quit",
                Style::default().fg(Color::DarkGray),
            ))
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_modal(&self, f: &mut Frame, modal: &ElementId, dimmed: bool) {
        let ids = self.renderer.modal_ids();
        let (title, lines, size) = match modal.as_str() {
            HELP_MODAL => (" Help ", help_lines(), (60, 60)),
            CONFIRM_MODAL => (" Confirm ", self.confirm_lines(), (50, 20)),
            FILTER_MODAL => (" Filter ", self.filter_lines(), (50, 30)),
            id if id == ids.view.as_str() => (" Prompt ", self.view_lines(), (70, 70)),
            id if id == ids.edit.as_str() => {
                let title = match self.state.edit_form.as_ref().and_then(|f| f.editing.as_ref()) {
                    Some(_) => " Edit prompt ",
                    None => " New prompt ",
                };
                (title, self.edit_lines(), (80, 80))
            }
            _ => return,
        };

        let area = centered_rect(size.0, size.1, f.area());
        let (text_style, border_style) = if dimmed {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
        } else {
            (Style::default().fg(Color::White), Style::default().fg(Color::Cyan))
        };
        let scroll = if modal == &ids.view { self.state.view_scroll } else { 0 };

        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines)
            .style(text_style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border_style),
            )
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn view_lines(&self) -> Vec<Line<'static>> {
        let state = self.renderer.store().snapshot();
        let Some(prompt) = state.current_prompt.as_ref() else {
            return vec![Line::from("Nothing selected")];
        };
        let labels = Labels::new(&state.categories, &state.tags);
        let tags = prompt
            .tags
            .iter()
            .map(|t| format!("#{}", labels.tag_label(t)))
            .collect::<Vec<_>>()
            .join(" ");

        let mut lines = vec![
            Line::from(Span::styled(prompt.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(vec![
                Span::styled(format!("[{}] ", labels.category_label(&prompt.category)), Style::default().fg(Color::Cyan)),
                Span::styled(tags, Style::default().fg(Color::Yellow)),
            ]),
        ];
        if let Some(description) = &prompt.description {
            lines.push(Line::from(Span::styled(
                description.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(""));
        lines.extend(prompt.content.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "e edit · d delete · c copy · ↑↓ scroll · Esc close",
            Style::default().fg(Color::DarkGray),
        )));
        lines
    }

    fn edit_lines(&self) -> Vec<Line<'static>> {
        let Some(form) = self.state.edit_form.as_ref() else {
            return Vec::new();
        };
        let focused = self.modals.host().focused();
        let is_focused = |id: &str| focused.as_ref().is_some_and(|f| f.as_str() == id);

        let mut lines = Vec::new();
        for field in EditField::ALL {
            let label_style = if is_focused(field.element_id()) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(field.label(), label_style)));
            let value = form.field(field);
            if value.is_empty() {
                lines.push(Line::from("  "));
            }
            lines.extend(value.lines().map(|l| Line::from(format!("  {}", l))));
            lines.push(Line::from(""));
        }

        let button = |id: &str, text: &str| {
            let style = if is_focused(id) {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(format!(" {} ", text), style)
        };
        lines.push(Line::from(vec![
            button(EDIT_SAVE, "Save"),
            Span::raw("  "),
            button(EDIT_CLOSE, "Cancel"),
            Span::styled("   Tab next field · Ctrl+S save · Esc cancel", Style::default().fg(Color::DarkGray)),
        ]));
        lines
    }

    fn filter_lines(&self) -> Vec<Line<'static>> {
        let store = self.renderer.store();
        let categories = store.categories();
        let tags = store.tags();
        let form = &self.state.filter_form;

        let category = form
            .selected_category(&categories)
            .map_or("Any".to_string(), |c| c.name.clone());
        let tag = form.selected_tag(&tags).map_or("Any".to_string(), |t| t.name.clone());
        let row = |label: &str, value: String, selected: bool| {
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<10}", label), style),
                Span::styled(format!("◀ {} ▶", value), style),
            ])
        };

        vec![
            row("Category", category, form.row == FilterRow::Category),
            row("Tag", tag, form.row == FilterRow::Tag),
            Line::from(""),
            Line::from(Span::styled(
                "↑↓ row · ←→ change · Enter apply · c clear · Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ]
    }

    fn confirm_lines(&self) -> Vec<Line<'static>> {
        let title = self
            .state
            .pending_delete
            .as_ref()
            .and_then(|id| self.renderer.store().find_prompt(id))
            .map_or_else(|| "this prompt".to_string(), |p| format!("'{}'", p.title));
        vec![
            Line::from(format!("Delete {}?", title)),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled("y delete · n keep", Style::default().fg(Color::DarkGray))),
        ]
    }
}

fn help_lines() -> Vec<Line<'static>> {
    [
        "  ↑/k ↓/j     - Move selection",
        "  Enter / v   - View prompt",
        "  e           - Edit prompt",
        "  n           - New prompt",
        "  d           - Delete prompt",
        "  c           - Copy prompt content",
        "  /           - Search",
        "  f           - Filter by category or tag",
        "  x           - Clear search and filters",
        "  m           - Load more",
        "  r           - Reload from server",
        "  Tab         - Next field in a dialog",
        "  Esc         - Close the top dialog",
        "  q           - Quit",
    ]
    .into_iter()
    .map(Line::from)
    .collect()
}

// Helper function for centering rectangles (for overlays)
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::model::{Category, Prompt, Tag};
    use crate::modal::ModalState;
    use crate::renderer::testing::FakeApi;
    use ratatui::backend::TestBackend;

    type App = PromptDeskTui<FakeApi, MemoryClipboard>;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(app.handle_key(press(KeyCode::Char(c))), Action::None);
        }
    }

    async fn app() -> App {
        let api = FakeApi::with_library(
            vec![
                Prompt::new("p1", "Explain lifetimes", "Explain the borrow error")
                    .with_category("c1")
                    .with_tags(["t1"]),
                Prompt::new("p2", "Essay outline", "Outline an essay").with_category("c2"),
                Prompt::new("p3", "Review diff", "Review this diff")
                    .with_category("c1")
                    .with_tags(["t2"]),
            ],
            vec![Category::new("c1", "Coding"), Category::new("c2", "Writing")],
            vec![Tag::new("t1", "rust"), Tag::new("t2", "review")],
        );
        let mut app = PromptDeskTui::new(api, MemoryClipboard::default(), &Settings::default());
        app.perform(Action::Refresh).await;
        app
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.ui(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_view_then_escape_restores_list_focus() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Enter));

        let view = app.renderer().modal_ids().view.clone();
        assert_eq!(app.modals().state_of(&view), ModalState::Active);
        assert_eq!(app.renderer().store().current_prompt().map(|p| p.id), Some("p2".to_string()));
        assert!(screen(&app).contains("Outline an essay"));

        app.handle_key(press(KeyCode::Esc));
        assert!(app.modals().is_empty());
        assert!(app.renderer().store().current_prompt().is_none());
        assert_eq!(app.modals().host().focused(), Some(ElementId::from(PROMPT_LIST)));
    }

    #[tokio::test]
    async fn test_edit_over_view_keeps_view_in_background() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('e')));

        let ids = app.renderer().modal_ids().clone();
        assert_eq!(app.modals().state_of(&ids.view), ModalState::Background);
        assert_eq!(app.modals().state_of(&ids.edit), ModalState::Active);
        assert_eq!(app.modals().host().focused(), Some(ElementId::from("edit-title")));

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.modals().state_of(&ids.view), ModalState::Active);
        assert!(app.state().edit_form.is_none());
        assert!(app.renderer().store().current_prompt().is_some());
    }

    #[tokio::test]
    async fn test_tab_stays_inside_edit_dialog() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('n')));
        let edit = app.renderer().modal_ids().edit.clone();

        for _ in 0..20 {
            app.handle_key(press(KeyCode::Tab));
            let focused = app.modals().host().focused().unwrap();
            assert!(app.modals().host().is_within(&edit, &focused));
        }
        app.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert!(app.modals().contains(&edit));
    }

    #[tokio::test]
    async fn test_new_prompt_form_saves() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('n')));
        type_text(&mut app, "Summarize");
        app.handle_key(press(KeyCode::Enter));
        type_text(&mut app, "Summarize the text");
        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "writing");

        let action = app.handle_key(ctrl('s'));
        assert_eq!(action, Action::Save);
        app.perform(action).await;

        assert!(app.modals().is_empty());
        let created = app.renderer().api().prompts.borrow().last().cloned().unwrap();
        assert_eq!(created.title, "Summarize");
        assert_eq!(created.category, "c2");
        assert_eq!(app.renderer().rendered().cards.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('n')));
        type_text(&mut app, "No body");
        app.perform(Action::Save).await;

        let edit = app.renderer().modal_ids().edit.clone();
        assert!(app.modals().contains(&edit));
        assert!(app.state().edit_form.is_some());
        assert!(screen(&app).contains("content is required"));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('d')));
        assert!(screen(&app).contains("Delete 'Explain lifetimes'?"));

        app.handle_key(press(KeyCode::Char('n')));
        assert!(app.modals().is_empty());
        assert_eq!(app.renderer().rendered().cards.len(), 3);

        app.handle_key(press(KeyCode::Char('d')));
        let action = app.handle_key(press(KeyCode::Char('y')));
        assert_eq!(action, Action::Delete("p1".to_string()));
        app.perform(action).await;
        assert_eq!(app.renderer().rendered().cards.len(), 2);
        assert!(app.modals().is_empty());
    }

    #[tokio::test]
    async fn test_delete_from_view_closes_view() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('d')));
        let action = app.handle_key(press(KeyCode::Enter));
        app.perform(action).await;

        assert!(app.modals().is_empty());
        assert!(app.renderer().store().find_prompt("p1").is_none());
    }

    #[tokio::test]
    async fn test_search_and_filter_modal() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('/')));
        type_text(&mut app, "review");
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.renderer().rendered().cards.len(), 1);

        app.handle_key(press(KeyCode::Char('x')));
        app.handle_key(press(KeyCode::Char('f')));
        app.handle_key(press(KeyCode::Right));
        app.handle_key(press(KeyCode::Enter));
        assert!(app.modals().is_empty());
        assert_eq!(app.renderer().criteria().category_id.as_deref(), Some("c1"));
        assert_eq!(app.renderer().rendered().cards.len(), 2);
        assert!(screen(&app).contains(" Coding "));
    }

    #[tokio::test]
    async fn test_copy_and_quit() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Char('c')));
        assert_eq!(app.clipboard().contents.as_deref(), Some("Explain the borrow error"));

        assert_eq!(app.handle_key(press(KeyCode::Char('q'))), Action::Quit);
        app.perform(Action::Quit).await;
        assert!(app.state().should_quit);
    }

    #[tokio::test]
    async fn test_background_dialog_is_dimmed_but_drawn() {
        let mut app = app().await;
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('?')));

        let view = app.renderer().modal_ids().view.clone();
        let presentation = app.modals().host().presentation(&view).unwrap();
        assert!(presentation.visible);
        assert!(presentation.inert);
        let text = screen(&app);
        assert!(text.contains("Help"));

        // Help swallows any key and closes
        app.handle_key(press(KeyCode::Char('z')));
        assert_eq!(app.modals().state_of(&view), ModalState::Active);
    }
}
