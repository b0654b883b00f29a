//! Per-instantiation id to object map

use std::collections::HashMap;

/// Objects built by one instantiation, indexed by template id.
///
/// Each id is written once, right after its object is constructed and before
/// any of its properties or children are applied.
#[derive(Debug, Clone)]
pub struct Registry<O> {
    objects: HashMap<String, O>,
    /// Ids in construction order
    order: Vec<String>,
}

impl<O> Default for Registry<O> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<O> Registry<O> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object. Returns false, leaving the registry unchanged, if
    /// the id is already taken.
    pub(crate) fn insert(&mut self, id: &str, object: O) -> bool {
        if self.objects.contains_key(id) {
            return false;
        }
        self.objects.insert(id.to_string(), object);
        self.order.push(id.to_string());
        true
    }

    /// Get the object built for an id
    pub fn get(&self, id: &str) -> Option<&O> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Ids in construction order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// (id, object) pairs in construction order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &O)> {
        self.order
            .iter()
            .filter_map(|id| self.objects.get(id).map(|o| (id.as_str(), o)))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
