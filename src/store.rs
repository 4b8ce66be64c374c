//! Observable application state
//!
//! [`AppStore`] is the single source of truth for the loaded categories,
//! tags, prompts and the prompt currently open in a modal. Every mutation
//! notifies subscribers synchronously, in registration order, before the
//! mutating call returns. Subscribers always receive a fresh copy of the
//! state; nothing outside the store can reach the internal value.
//!
//! The store is single-threaded (`Rc` + `RefCell`). Cloning an [`AppStore`]
//! hands out another handle to the same state.

use crate::model::{Category, Prompt, Tag};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use tracing::{debug, error};

/// Snapshot of everything the store tracks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub prompts: Vec<Prompt>,
    pub current_prompt: Option<Prompt>,
}

/// Replace several fields with a single notification
///
/// Fields left as `None` are untouched. `current_prompt: Some(None)` clears
/// the current prompt.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub categories: Option<Vec<Category>>,
    pub tags: Option<Vec<Tag>>,
    pub prompts: Option<Vec<Prompt>>,
    pub current_prompt: Option<Option<Prompt>>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        self.categories.is_none()
            && self.tags.is_none()
            && self.prompts.is_none()
            && self.current_prompt.is_none()
    }
}

type Listener = Rc<dyn Fn(&AppState)>;

struct StoreInner {
    state: RefCell<AppState>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener_id: Cell<u64>,
}

#[derive(Clone)]
pub struct AppStore {
    inner: Rc<StoreInner>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(state),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
            }),
        }
    }

    pub fn snapshot(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.inner.state.borrow().categories.clone()
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.inner.state.borrow_mut().categories = categories;
        self.notify("categories");
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.inner.state.borrow().tags.clone()
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        self.inner.state.borrow_mut().tags = tags;
        self.notify("tags");
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.inner.state.borrow().prompts.clone()
    }

    pub fn set_prompts(&self, prompts: Vec<Prompt>) {
        self.inner.state.borrow_mut().prompts = prompts;
        self.notify("prompts");
    }

    pub fn current_prompt(&self) -> Option<Prompt> {
        self.inner.state.borrow().current_prompt.clone()
    }

    pub fn set_current_prompt(&self, prompt: Option<Prompt>) {
        self.inner.state.borrow_mut().current_prompt = prompt;
        self.notify("current_prompt");
    }

    /// Look up a loaded prompt by id
    pub fn find_prompt(&self, id: &str) -> Option<Prompt> {
        self.inner
            .state
            .borrow()
            .prompts
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Apply a multi-field update, notifying once. Empty patches are ignored.
    pub fn apply(&self, patch: StatePatch) {
        if patch.is_empty() {
            return;
        }
        {
            let mut state = self.inner.state.borrow_mut();
            if let Some(categories) = patch.categories {
                state.categories = categories;
            }
            if let Some(tags) = patch.tags {
                state.tags = tags;
            }
            if let Some(prompts) = patch.prompts {
                state.prompts = prompts;
            }
            if let Some(current) = patch.current_prompt {
                state.current_prompt = current;
            }
        }
        self.notify("patch");
    }

    /// Register a listener. It runs once right away with the current state,
    /// then after every mutation until unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AppState) + 'static,
    {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);

        let listener: Listener = Rc::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));
        debug!(listener_id = id, "Store subscriber added");

        let snapshot = self.snapshot();
        invoke(id, &listener, &snapshot);

        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
            active: Cell::new(true),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn notify(&self, field: &'static str) {
        // Listeners may mutate the store or (un)subscribe while being
        // notified, so the list is copied and the state is re-read per
        // listener. The last state each listener sees is the current one.
        let listeners: Vec<(u64, Listener)> = self.inner.listeners.borrow().clone();
        debug!(field, listeners = listeners.len(), "Store changed");

        for (id, listener) in &listeners {
            let snapshot = self.snapshot();
            invoke(*id, listener, &snapshot);
        }
    }
}

fn invoke(id: u64, listener: &Listener, state: &AppState) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(state)));
    if outcome.is_err() {
        error!(listener_id = id, "Store subscriber panicked; continuing with remaining subscribers");
    }
}

/// Handle returned by [`AppStore::subscribe`]
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
    active: Cell<bool>,
}

impl Subscription {
    /// Remove the listener. Further calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
            debug!(listener_id = self.id, "Store subscriber removed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(store: &AppStore) -> (Rc<RefCell<Vec<AppState>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |state| sink.borrow_mut().push(state.clone()));
        (seen, sub)
    }

    #[test]
    fn test_subscribe_replays_empty_state() {
        let store = AppStore::new();
        let (seen, _sub) = recorder(&store);

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], AppState::default());
        assert!(store.prompts().is_empty());
    }

    #[test]
    fn test_every_setter_notifies_synchronously() {
        let store = AppStore::new();
        let (seen, _sub) = recorder(&store);

        store.set_categories(vec![Category::new("c1", "Coding")]);
        assert_eq!(seen.borrow().len(), 2);
        store.set_tags(vec![Tag::new("t1", "rust")]);
        store.set_prompts(vec![Prompt::new("p1", "A", "a")]);
        store.set_current_prompt(Some(Prompt::new("p1", "A", "a")));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[4].prompts.len(), 1);
        assert_eq!(seen[4].current_prompt.as_ref().map(|p| p.id.as_str()), Some("p1"));
    }

    #[test]
    fn test_setters_replace_whole_collection() {
        let store = AppStore::new();
        store.set_prompts(vec![Prompt::new("p1", "A", "a"), Prompt::new("p2", "B", "b")]);
        store.set_prompts(vec![Prompt::new("p3", "C", "c")]);
        let ids: Vec<String> = store.prompts().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p3"]);
    }

    #[test]
    fn test_getters_return_copies() {
        let store = AppStore::new();
        store.set_prompts(vec![Prompt::new("p1", "A", "a")]);

        let mut copy = store.prompts();
        copy[0].title = "mutated".to_string();
        copy.clear();

        assert_eq!(store.prompts()[0].title, "A");
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_targeted() {
        let store = AppStore::new();
        let (first, first_sub) = recorder(&store);
        let (second, _second_sub) = recorder(&store);

        first_sub.unsubscribe();
        first_sub.unsubscribe();
        assert!(!first_sub.is_active());
        assert_eq!(store.subscriber_count(), 1);

        store.set_tags(vec![Tag::new("t1", "rust")]);
        assert_eq!(first.borrow().len(), 1);
        assert_eq!(second.borrow().len(), 2);
    }

    #[test]
    fn test_notification_order_is_registration_order() {
        let store = AppStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<Subscription> = (0..3)
            .map(|n| {
                let order = Rc::clone(&order);
                store.subscribe(move |_| order.borrow_mut().push(n))
            })
            .collect();

        order.borrow_mut().clear();
        store.set_prompts(vec![]);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let store = AppStore::new();
        let armed = Rc::new(Cell::new(false));
        let trigger = Rc::clone(&armed);
        let _bad = store.subscribe(move |_| {
            if trigger.get() {
                panic!("listener failure");
            }
        });
        let (seen, _good) = recorder(&store);

        armed.set(true);
        store.set_prompts(vec![Prompt::new("p1", "A", "a")]);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_patch_notifies_once() {
        let store = AppStore::new();
        let (seen, _sub) = recorder(&store);

        store.apply(StatePatch {
            categories: Some(vec![Category::new("c1", "Coding")]),
            tags: Some(vec![Tag::new("t1", "rust")]),
            prompts: Some(vec![Prompt::new("p1", "A", "a")]),
            current_prompt: None,
        });
        store.apply(StatePatch::default());

        assert_eq!(seen.borrow().len(), 2);
        let last = seen.borrow()[1].clone();
        assert_eq!(last.categories.len(), 1);
        assert_eq!(last.tags.len(), 1);
        assert_eq!(last.prompts.len(), 1);
    }

    #[test]
    fn test_listener_may_mutate_store() {
        let store = AppStore::new();
        let handle = store.clone();
        let _sub = store.subscribe(move |state| {
            if state.prompts.len() == 1 && state.current_prompt.is_none() {
                handle.set_current_prompt(state.prompts.first().cloned());
            }
        });

        store.set_prompts(vec![Prompt::new("p1", "A", "a")]);
        assert_eq!(store.current_prompt().map(|p| p.id), Some("p1".to_string()));
    }

    #[test]
    fn test_nested_mutation_leaves_later_listeners_current() {
        let store = AppStore::new();
        let handle = store.clone();
        let _first = store.subscribe(move |state| {
            if state.prompts.len() == 1 && state.current_prompt.is_none() {
                handle.set_current_prompt(state.prompts.first().cloned());
            }
        });
        let (seen, _second) = recorder(&store);

        store.set_prompts(vec![Prompt::new("p1", "A", "a")]);

        let last = seen.borrow().last().cloned();
        assert_eq!(last, Some(store.snapshot()));
        assert_eq!(
            last.and_then(|s| s.current_prompt).map(|p| p.id),
            Some("p1".to_string())
        );
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = AppStore::new();
        let sub = store.subscribe(|_| {});
        drop(store);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
