use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use shared::domain::{ElementKey, StyleProperty};

/// Text and style access to addressable UI elements.
///
/// Writes to an element the host does not know about are ignored.
pub trait UiRenderer: Send + Sync {
    fn has_element(&self, key: &ElementKey) -> bool;
    fn text(&self, key: &ElementKey) -> Option<String>;
    fn set_text(&self, key: &ElementKey, text: &str);
    fn style(&self, key: &ElementKey, property: StyleProperty) -> Option<String>;
    fn set_style(&self, key: &ElementKey, property: StyleProperty, value: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    pub text: String,
    pub styles: BTreeMap<StyleProperty, String>,
}

/// In-process element table used by the CLI host and tests.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    elements: RwLock<BTreeMap<ElementKey, ElementState>>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ElementKey>,
    {
        let renderer = Self::new();
        for key in keys {
            renderer.register(key);
        }
        renderer
    }

    /// Adds an empty element; an existing element keeps its state.
    pub fn register(&self, key: impl Into<ElementKey>) {
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.into())
            .or_default();
    }

    pub fn remove(&self, key: &ElementKey) -> Option<ElementState> {
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn snapshot(&self) -> BTreeMap<ElementKey, ElementState> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, key: &ElementKey, apply: impl FnOnce(&mut ElementState)) {
        let mut elements = self.elements.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = elements.get_mut(key) {
            apply(state);
        }
    }
}

impl UiRenderer for MemoryRenderer {
    fn has_element(&self, key: &ElementKey) -> bool {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn text(&self, key: &ElementKey) -> Option<String> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|state| state.text.clone())
    }

    fn set_text(&self, key: &ElementKey, text: &str) {
        self.update(key, |state| state.text = text.to_string());
    }

    fn style(&self, key: &ElementKey, property: StyleProperty) -> Option<String> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|state| state.styles.get(&property).cloned())
    }

    fn set_style(&self, key: &ElementKey, property: StyleProperty, value: &str) {
        self.update(key, |state| {
            state.styles.insert(property, value.to_string());
        });
    }
}
