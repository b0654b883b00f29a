//! The object system collaborator
//!
//! Everything that knows about concrete object types lives behind
//! [`ObjectSystem`]. Templates store the resolved [`ObjectSystem::Type`] handle;
//! instantiation only ever constructs, sets properties, composes and connects
//! through this trait.

pub mod memory;

use std::fmt;

use crate::value::{EnumValue, Value};

pub use memory::{MemoryCallback, MemoryError, MemoryObject, MemoryObjects, MemoryType, TypeSpec};

/// External provider of constructible types, property access, composition,
/// and event subscription.
pub trait ObjectSystem {
    /// A resolved, constructible type
    type Type: Clone + fmt::Debug;
    /// Handle to a live object; cloning yields another handle to the same object
    type Object: Clone;
    /// Event callback accepted by [`ObjectSystem::connect`]
    type Callback: Clone;
    /// Failure reported by the object system itself
    type Error: std::error::Error + 'static;

    /// Resolve `(namespace, bare type)` to a constructible type
    fn lookup_type(&self, namespace: &str, name: &str) -> Option<Self::Type>;

    /// Construct a fresh object of `ty` with no arguments
    fn construct(&self, ty: &Self::Type) -> Result<Self::Object, Self::Error>;

    /// Set a property on an object
    fn set_property(
        &self,
        object: &Self::Object,
        name: &str,
        value: Value<Self::Object>,
    ) -> Result<(), Self::Error>;

    /// Make `child` a child of `parent`
    fn compose(&self, parent: &Self::Object, child: &Self::Object) -> Result<(), Self::Error>;

    /// Set a property of the parent/child relationship
    fn set_child_property(
        &self,
        parent: &Self::Object,
        child: &Self::Object,
        name: &str,
        value: Value<Self::Object>,
    ) -> Result<(), Self::Error>;

    /// Subscribe `callback` to `event` on `object`
    fn connect(
        &self,
        object: &Self::Object,
        event: &str,
        callback: Self::Callback,
    ) -> Result<(), Self::Error>;

    /// Whether properties called `property` hold enumeration members
    fn is_enum_property(&self, _property: &str) -> bool {
        false
    }

    /// Look up an enumeration member by its normalised (upper-case,
    /// underscore-separated) name
    fn enum_member(&self, _property: &str, _member: &str) -> Option<EnumValue> {
        None
    }

    /// Whether `property` holds a reference to another object.
    ///
    /// `owner` is `None` for child (packing) properties.
    fn is_reference_property(&self, _owner: Option<&Self::Type>, _property: &str) -> bool {
        false
    }
}
