use std::cell::RefCell;
use std::collections::HashMap;

use leptos::prelude::*;

use venuemap_shared::VenueId;

/// A list element that can be brought into view.
pub trait ScrollTarget {
    /// Still attached to the document.
    fn is_connected(&self) -> bool;
    /// Nearest-edge smooth scroll.
    fn scroll_nearest(&self);
}

/// Single owner of the selected venue id.
///
/// Both the marker layer and the list layer read [`selected`] on every render;
/// neither mutates it except through [`select`] and [`deselect`]. Selecting a
/// new id scrolls the list element registered for it exactly once.
///
/// [`selected`]: SelectionCoordinator::selected
/// [`select`]: SelectionCoordinator::select
/// [`deselect`]: SelectionCoordinator::deselect
pub struct SelectionCoordinator<E> {
    selected: Option<VenueId>,
    elements: HashMap<VenueId, E>,
}

impl<E> Default for SelectionCoordinator<E> {
    fn default() -> Self {
        Self {
            selected: None,
            elements: HashMap::new(),
        }
    }
}

impl<E: ScrollTarget> SelectionCoordinator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Select `id`. Re-selecting the current id is not a transition and does
    /// not scroll again. An id with no registered element still becomes the
    /// selection. Returns whether the selection changed.
    pub fn select(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        if let Some(element) = self.elements.get(id).filter(|e| e.is_connected()) {
            element.scroll_nearest();
        }
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Record the list element for `id`, replacing any earlier one.
    pub fn register(&mut self, id: impl Into<VenueId>, element: E) {
        self.elements.insert(id.into(), element);
    }

    pub fn unregister(&mut self, id: &str) {
        self.elements.remove(id);
    }

    #[cfg(test)]
    pub fn registered(&self) -> usize {
        self.elements.len()
    }
}

impl ScrollTarget for web_sys::Element {
    fn is_connected(&self) -> bool {
        web_sys::Node::is_connected(self)
    }

    fn scroll_nearest(&self) {
        let options = web_sys::ScrollIntoViewOptions::new();
        options.set_block(web_sys::ScrollLogicalPosition::Nearest);
        options.set_behavior(web_sys::ScrollBehavior::Smooth);
        self.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

thread_local! {
    static COORDINATOR: RefCell<SelectionCoordinator<web_sys::Element>> =
        RefCell::new(SelectionCoordinator::new());
}

/// Reactive mirror of the page's selection coordinator, provided via context.
/// Layers read the signal; every write goes through the coordinator first.
#[derive(Clone, Copy)]
pub struct Selected(pub RwSignal<Option<VenueId>>);

impl Selected {
    pub fn new() -> Self {
        COORDINATOR.with(|c| c.borrow_mut().deselect());
        Self(RwSignal::new(None))
    }

    pub fn select(&self, id: &str) {
        if COORDINATOR.with(|c| c.borrow_mut().select(id)) {
            self.0.set(Some(id.to_string()));
        }
    }

    pub fn deselect(&self) {
        if COORDINATOR.with(|c| c.borrow_mut().deselect()) {
            self.0.set(None);
        }
    }

    pub fn register(&self, id: &str, element: web_sys::Element) {
        COORDINATOR.with(|c| c.borrow_mut().register(id, element));
    }

    pub fn unregister(&self, id: &str) {
        COORDINATOR.with(|c| c.borrow_mut().unregister(id));
    }
}
