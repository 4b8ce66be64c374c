//! Modal dialog stack
//!
//! Several modals may be open at once (a confirm dialog on top of an edit
//! form on top of a prompt view). [`ModalStack`] keeps them in LIFO order and
//! guarantees that exactly one of them, the topmost, is interactive:
//!
//! - the active modal is visible, not inert, receives focus, and traps
//!   Tab / Shift+Tab within its focusable descendants;
//! - background modals stay visible but are inert and `aria-hidden`, and only
//!   their close control accepts pointer input;
//! - closed modals are hidden, inert and have no z-index.
//!
//! Closing a modal hands focus back to whatever was focused right before
//! that modal opened. The stack talks to the page through [`ModalHost`], so
//! the same logic drives the terminal UI and the tests.

mod document;

pub use document::{Element, VirtualDocument};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// z-index given to the bottom modal; each level above adds [`Z_INDEX_STEP`]
pub const BASE_Z_INDEX: u32 = 1050;
pub const Z_INDEX_STEP: u32 = 10;

/// Identifier of an element on the page (a modal container, a button, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Background,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvents {
    All,
    /// Only the modal's close control reacts
    CloseControlOnly,
    None,
}

/// Attribute set applied to a modal container for a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub visible: bool,
    pub inert: bool,
    pub aria_hidden: bool,
    pub pointer_events: PointerEvents,
    pub z_index: Option<u32>,
}

impl Presentation {
    pub fn closed() -> Self {
        Self {
            visible: false,
            inert: true,
            aria_hidden: true,
            pointer_events: PointerEvents::None,
            z_index: None,
        }
    }

    /// Presentation for `state` at stack position `depth` (0 = bottom)
    pub fn for_state(state: ModalState, depth: usize) -> Self {
        let z_index = Some(BASE_Z_INDEX + Z_INDEX_STEP * depth as u32);
        match state {
            ModalState::Active => Self {
                visible: true,
                inert: false,
                aria_hidden: false,
                pointer_events: PointerEvents::All,
                z_index,
            },
            ModalState::Background => Self {
                visible: true,
                inert: true,
                aria_hidden: true,
                pointer_events: PointerEvents::CloseControlOnly,
                z_index,
            },
            ModalState::Closed => Self::closed(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.visible && !self.inert
    }
}

/// Keys the stack reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Escape,
    Tab,
    BackTab,
}

/// The page the stack manipulates
pub trait ModalHost {
    fn exists(&self, id: &ElementId) -> bool;
    /// True when `element` is `container` or one of its descendants
    fn is_within(&self, container: &ElementId, element: &ElementId) -> bool;
    /// Focusable descendants of `modal`, in document order
    fn focusable_within(&self, modal: &ElementId) -> Vec<ElementId>;
    fn close_control(&self, modal: &ElementId) -> Option<ElementId>;
    fn apply_presentation(&mut self, modal: &ElementId, presentation: Presentation);
    fn presentation(&self, modal: &ElementId) -> Option<Presentation>;
    fn focused(&self) -> Option<ElementId>;
    /// Move focus; returns false when the element cannot take focus
    fn focus(&mut self, element: &ElementId) -> bool;
    /// Page-level "a modal is open" flag (scroll lock, backdrop)
    fn set_modal_open(&mut self, open: bool);
}

#[derive(Debug, Clone)]
struct StackEntry {
    modal: ElementId,
    return_focus: Option<ElementId>,
}

pub struct ModalStack<H: ModalHost> {
    host: H,
    entries: Vec<StackEntry>,
}

impl<H: ModalHost> ModalStack<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            entries: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, modal: &ElementId) -> bool {
        self.position(modal).is_some()
    }

    /// The topmost, interactive modal
    pub fn active(&self) -> Option<&ElementId> {
        self.entries.last().map(|e| &e.modal)
    }

    /// Open modals, bottom first
    pub fn modals(&self) -> impl Iterator<Item = &ElementId> {
        self.entries.iter().map(|e| &e.modal)
    }

    pub fn state_of(&self, modal: &ElementId) -> ModalState {
        match self.position(modal) {
            None => ModalState::Closed,
            Some(i) if i + 1 == self.entries.len() => ModalState::Active,
            Some(_) => ModalState::Background,
        }
    }

    fn position(&self, modal: &ElementId) -> Option<usize> {
        self.entries.iter().position(|e| &e.modal == modal)
    }

    /// Open `modal` on top of the stack
    ///
    /// Re-opening a modal that is already stacked moves it to the top and
    /// keeps the focus target recorded when it was first opened. Returns
    /// false (and does nothing) when the element does not exist.
    pub fn open(&mut self, modal: &ElementId) -> bool {
        if !self.host.exists(modal) {
            warn!(modal = %modal, "Cannot open modal: element not found");
            return false;
        }

        let entry = match self.position(modal) {
            Some(i) => self.entries.remove(i),
            None => StackEntry {
                modal: modal.clone(),
                return_focus: self.host.focused(),
            },
        };
        self.entries.push(entry);
        self.host.set_modal_open(true);
        self.refresh_presentations();
        self.focus_initial(modal);

        debug!(modal = %modal, depth = self.entries.len(), "Modal opened");
        true
    }

    /// Close `modal` wherever it sits in the stack
    ///
    /// Returns false when the modal was not open.
    pub fn close(&mut self, modal: &ElementId) -> bool {
        let Some(index) = self.position(modal) else {
            debug!(modal = %modal, "Close ignored: modal not open");
            return false;
        };
        let was_active = index + 1 == self.entries.len();
        let entry = self.entries.remove(index);

        self.host.apply_presentation(&entry.modal, Presentation::closed());

        if !was_active {
            // Modals opened from inside the one being closed can no longer
            // return focus there; send them to where it would have gone.
            for above in &mut self.entries[index..] {
                let points_inside = above
                    .return_focus
                    .as_ref()
                    .is_some_and(|f| self.host.is_within(&entry.modal, f));
                if points_inside {
                    above.return_focus = entry.return_focus.clone();
                }
            }
        }

        self.refresh_presentations();
        if self.entries.is_empty() {
            self.host.set_modal_open(false);
        }

        if was_active {
            self.restore_focus(entry.return_focus.as_ref());
        }

        debug!(modal = %modal, depth = self.entries.len(), "Modal closed");
        true
    }

    /// Close the active modal, if any
    pub fn close_active(&mut self) -> Option<ElementId> {
        let top = self.active()?.clone();
        self.close(&top);
        Some(top)
    }

    /// Close every modal, topmost first
    pub fn close_all(&mut self) {
        while self.close_active().is_some() {}
    }

    /// Route a key press. Returns true when the stack consumed it.
    pub fn handle_key(&mut self, key: ModalKey) -> bool {
        let Some(active) = self.active().cloned() else {
            return false;
        };
        match key {
            ModalKey::Escape => self.close(&active),
            ModalKey::Tab => {
                self.cycle_focus(&active, true);
                true
            }
            ModalKey::BackTab => {
                self.cycle_focus(&active, false);
                true
            }
        }
    }

    /// Whether a pointer event on `element` inside `modal` should be honoured
    pub fn accepts_pointer(&self, modal: &ElementId, element: &ElementId) -> bool {
        match self.state_of(modal) {
            ModalState::Active => self.host.is_within(modal, element),
            ModalState::Background => self.host.close_control(modal).as_ref() == Some(element),
            ModalState::Closed => false,
        }
    }

    /// Click dispatch: activates the close control of any stacked modal,
    /// ignores clicks the modal's state does not allow
    pub fn click(&mut self, modal: &ElementId, element: &ElementId) -> bool {
        if !self.accepts_pointer(modal, element) {
            return false;
        }
        if self.host.close_control(modal).as_ref() == Some(element) {
            return self.close(modal);
        }
        self.host.focus(element)
    }

    fn refresh_presentations(&mut self) {
        let top = self.entries.len().saturating_sub(1);
        for (depth, entry) in self.entries.iter().enumerate() {
            let state = if depth == top {
                ModalState::Active
            } else {
                ModalState::Background
            };
            self.host
                .apply_presentation(&entry.modal, Presentation::for_state(state, depth));
        }
    }

    fn focus_initial(&mut self, modal: &ElementId) {
        let first = self.host.focusable_within(modal).into_iter().next();
        let target = first.unwrap_or_else(|| modal.clone());
        self.host.focus(&target);
    }

    fn restore_focus(&mut self, target: Option<&ElementId>) {
        // While modals remain open, focus has to land inside the new active one.
        let usable = target.filter(|t| match self.active() {
            Some(active) => self.host.is_within(active, t),
            None => self.host.exists(t),
        });
        if let Some(target) = usable.cloned() {
            if self.host.focus(&target) {
                return;
            }
        }
        if let Some(active) = self.active().cloned() {
            self.focus_initial(&active);
        }
    }

    fn cycle_focus(&mut self, modal: &ElementId, forward: bool) {
        let focusable = self.host.focusable_within(modal);
        if focusable.is_empty() {
            self.host.focus(modal);
            return;
        }
        let current = self
            .host
            .focused()
            .and_then(|f| focusable.iter().position(|e| *e == f));
        let len = focusable.len();
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.host.focus(&focusable[next]);
    }
}

impl<H: ModalHost + fmt::Debug> fmt::Debug for ModalStack<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalStack")
            .field("entries", &self.entries)
            .field("host", &self.host)
            .finish()
    }
}
