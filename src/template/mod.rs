//! Compiled, immutable object templates
//!
//! A [`Template`] describes how to build one object: its resolved type, the
//! raw text of its properties, its signal bindings and its children. Templates
//! are produced once by [`compile`] and shared by every instantiation.

mod compiler;
mod set;

pub use compiler::compile;
pub use set::TemplateSet;

use std::sync::Arc;

use crate::markup::Span;

/// A class name split into namespace and bare type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.namespace, self.name)
    }
}

/// A property whose value is coerced at instantiation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Text exactly as written in the document, entities decoded
    pub raw: String,
    pub span: Span,
}

/// An event to connect to a named handler at bind time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalBinding {
    pub event: String,
    pub handler: String,
}

/// A nested template plus the properties of its edge to the parent
#[derive(Debug)]
pub struct ChildTemplate<T> {
    pub template: Arc<Template<T>>,
    /// Properties from `<packing>`, applied with `set_child_property`
    pub packing: Vec<PropertyDescriptor>,
}

/// Compiled descriptor for one `<object>` element
#[derive(Debug)]
pub struct Template<T> {
    pub id: String,
    /// The `class` attribute as written; also the override table key
    pub class: String,
    pub type_ref: TypeRef,
    /// Type handle from the object system
    pub resolved: T,
    pub properties: Vec<PropertyDescriptor>,
    pub signals: Vec<SignalBinding>,
    pub children: Vec<ChildTemplate<T>>,
    pub span: Span,
}

impl<T> Template<T> {
    /// Visit this template and all descendants depth-first in document order
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Template<T>)) {
        visit(self);
        for child in &self.children {
            child.template.walk(visit);
        }
    }

    /// Number of templates in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| c.template.subtree_len())
            .sum::<usize>()
    }
}
