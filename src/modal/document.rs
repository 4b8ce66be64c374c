//! In-memory page used as the modal host
//!
//! Elements form a tree (parent links) kept in insertion order, which stands
//! in for document order. Modal containers carry a [`Presentation`]; focus
//! is refused for anything inside a hidden or inert modal.

use super::{ElementId, ModalHost, Presentation};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub parent: Option<ElementId>,
    pub focusable: bool,
    pub is_modal: bool,
    pub presentation: Option<Presentation>,
    pub close_control: Option<ElementId>,
}

#[derive(Debug, Default)]
pub struct VirtualDocument {
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
    focused: Option<ElementId>,
    modal_open: bool,
}

impl VirtualDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, element: Element) {
        if !self.elements.contains_key(&element.id) {
            self.order.push(element.id.clone());
        }
        self.elements.insert(element.id.clone(), element);
    }

    /// Register a modal container. It starts out closed.
    pub fn add_modal(&mut self, id: &str) {
        self.insert(Element {
            id: ElementId::from(id),
            parent: None,
            focusable: false,
            is_modal: true,
            presentation: Some(Presentation::closed()),
            close_control: None,
        });
    }

    pub fn add_focusable(&mut self, id: &str, parent: Option<&str>) {
        self.insert(Element {
            id: ElementId::from(id),
            parent: parent.map(ElementId::from),
            focusable: true,
            is_modal: false,
            presentation: None,
            close_control: None,
        });
    }

    /// Add a focusable close button to `modal` and mark it as the close control
    pub fn add_close_control(&mut self, modal: &str, id: &str) {
        self.add_focusable(id, Some(modal));
        if let Some(element) = self.elements.get_mut(&ElementId::from(modal)) {
            element.close_control = Some(ElementId::from(id));
        }
    }

    pub fn remove(&mut self, id: &str) {
        let id = ElementId::from(id);
        self.elements.remove(&id);
        self.order.retain(|e| *e != id);
        if self.focused.as_ref() == Some(&id) {
            self.focused = None;
        }
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    /// Nearest modal container enclosing `id` (or `id` itself)
    fn enclosing_modal(&self, id: &ElementId) -> Option<&Element> {
        let mut current = self.elements.get(id);
        while let Some(element) = current {
            if element.is_modal {
                return Some(element);
            }
            current = element.parent.as_ref().and_then(|p| self.elements.get(p));
        }
        None
    }

    fn can_take_focus(&self, id: &ElementId) -> bool {
        let Some(element) = self.elements.get(id) else {
            return false;
        };
        match self.enclosing_modal(id) {
            Some(modal) => {
                let interactive = modal.presentation.is_some_and(|p| p.is_interactive());
                interactive && (element.focusable || element.is_modal)
            }
            None => element.focusable,
        }
    }
}

impl ModalHost for VirtualDocument {
    fn exists(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    fn is_within(&self, container: &ElementId, element: &ElementId) -> bool {
        let mut current = self.elements.get(element);
        while let Some(e) = current {
            if &e.id == container {
                return true;
            }
            current = e.parent.as_ref().and_then(|p| self.elements.get(p));
        }
        false
    }

    fn focusable_within(&self, modal: &ElementId) -> Vec<ElementId> {
        self.order
            .iter()
            .filter(|id| *id != modal && self.is_within(modal, id))
            .filter(|id| self.elements.get(*id).is_some_and(|e| e.focusable))
            .cloned()
            .collect()
    }

    fn close_control(&self, modal: &ElementId) -> Option<ElementId> {
        self.elements.get(modal).and_then(|e| e.close_control.clone())
    }

    fn apply_presentation(&mut self, modal: &ElementId, presentation: Presentation) {
        if let Some(element) = self.elements.get_mut(modal) {
            element.presentation = Some(presentation);
        }
    }

    fn presentation(&self, modal: &ElementId) -> Option<Presentation> {
        self.elements.get(modal).and_then(|e| e.presentation)
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused.clone()
    }

    fn focus(&mut self, element: &ElementId) -> bool {
        if !self.can_take_focus(element) {
            trace!(element = %element, "Focus refused");
            return false;
        }
        self.focused = Some(element.clone());
        true
    }

    fn set_modal_open(&mut self, open: bool) {
        self.modal_open = open;
    }
}
