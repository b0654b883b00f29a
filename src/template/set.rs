//! Id-indexed collection of compiled templates

use std::collections::HashMap;
use std::sync::Arc;

use super::Template;

/// Every template of one compilation unit, indexed by id.
///
/// Nested templates appear both here and in their parent's child list; both
/// share one `Arc`.
#[derive(Debug)]
pub struct TemplateSet<T> {
    templates: HashMap<String, Arc<Template<T>>>,
    /// Ids in document order
    order: Vec<String>,
    /// Ids of direct `<interface>` children
    roots: Vec<String>,
}

impl<T> Default for TemplateSet<T> {
    fn default() -> Self {
        Self {
            templates: HashMap::new(),
            order: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<T> TemplateSet<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `id` at its document position; the template itself is inserted
    /// once its children are compiled
    pub(crate) fn reserve(&mut self, id: &str) {
        self.order.push(id.to_string());
    }

    pub(crate) fn insert(&mut self, template: Arc<Template<T>>) {
        self.templates.insert(template.id.clone(), template);
    }

    pub(crate) fn push_root(&mut self, id: &str) {
        self.roots.push(id.to_string());
    }

    /// Get a template by id
    pub fn get(&self, id: &str) -> Option<&Arc<Template<T>>> {
        self.templates.get(id)
    }

    /// Check if a template with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// All ids in document order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Top-level templates in document order
    pub fn roots(&self) -> impl Iterator<Item = &Arc<Template<T>>> {
        self.roots.iter().filter_map(|id| self.templates.get(id))
    }

    /// All templates in document order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template<T>>> {
        self.order.iter().filter_map(|id| self.templates.get(id))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
