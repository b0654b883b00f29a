//! In-memory object system
//!
//! A property-bag implementation of [`ObjectSystem`]: objects are plain
//! records of properties, children and event callbacks. It backs the test
//! suite and the command line tool's dry runs, and serves as a reference for
//! writing bindings to a real toolkit.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::ObjectSystem;
use crate::config::ConfigError;
use crate::value::{EnumValue, Value};

/// Errors raised by [`MemoryObjects`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("type {class} has no property '{property}'")]
    UnknownProperty { class: String, property: String },

    #[error("type {class} has no signal '{event}'")]
    UnknownSignal { class: String, event: String },

    #[error("type {class} cannot hold children")]
    NotAContainer { class: String },

    #[error("{class} object already has a parent")]
    AlreadyParented { class: String },

    #[error("{child} object is not a child of this {parent} object")]
    NotAChild { parent: String, child: String },

    #[error("type {class} is abstract and cannot be constructed")]
    Abstract { class: String },
}

/// Declaration of one type in the in-memory object system
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TypeSpec {
    /// Allowed property names; `None` accepts any property
    pub properties: Option<BTreeSet<String>>,
    /// Allowed signal names; `None` accepts any signal
    pub signals: Option<BTreeSet<String>>,
    /// Properties whose values reference other objects
    pub references: BTreeSet<String>,
    /// Whether objects of this type accept children
    pub container: bool,
    /// Abstract types resolve but refuse construction
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
}

impl TypeSpec {
    /// A type accepting any property and signal, without children
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow children
    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    /// Restrict properties to the given names
    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict signals to the given names
    pub fn with_signals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signals = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Declare an object-valued property
    pub fn with_reference(mut self, property: impl Into<String>) -> Self {
        self.references.insert(property.into());
        self
    }

    /// Mark the type abstract
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    fn permissive() -> Self {
        Self::new().container()
    }
}

/// A resolved in-memory type
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryType {
    pub namespace: String,
    pub name: String,
    pub spec: TypeSpec,
}

impl MemoryType {
    /// Namespace and bare name joined, e.g. `GtkLabel`
    pub fn class(&self) -> String {
        format!("{}{}", self.namespace, self.name)
    }
}

/// An enumeration declared for a property name
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EnumSpec {
    pub name: String,
    pub members: Vec<String>,
}

/// Callback type used by [`MemoryObjects`]; receives the emitting object
pub type MemoryCallback = Rc<dyn Fn(&MemoryObject)>;

struct ChildSlot {
    object: MemoryObject,
    properties: Vec<(String, Value<MemoryObject>)>,
}

struct ObjectData {
    ty: Arc<MemoryType>,
    properties: Vec<(String, Value<MemoryObject>)>,
    children: Vec<ChildSlot>,
    handlers: Vec<(String, MemoryCallback)>,
    has_parent: bool,
}

/// Handle to an in-memory object. Clones share the same object.
#[derive(Clone)]
pub struct MemoryObject(Rc<RefCell<ObjectData>>);

fn upsert(list: &mut Vec<(String, Value<MemoryObject>)>, name: &str, value: Value<MemoryObject>) {
    match list.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = value,
        None => list.push((name.to_string(), value)),
    }
}

impl MemoryObject {
    fn new(ty: Arc<MemoryType>) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            ty,
            properties: Vec::new(),
            children: Vec::new(),
            handlers: Vec::new(),
            has_parent: false,
        })))
    }

    /// Whether two handles refer to the same object
    pub fn ptr_eq(&self, other: &MemoryObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The class name, e.g. `GtkWindow`
    pub fn class(&self) -> String {
        self.0.borrow().ty.class()
    }

    /// Current value of a property
    pub fn property(&self, name: &str) -> Option<Value<MemoryObject>> {
        self.0
            .borrow()
            .properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Set a property directly, bypassing type checks
    pub fn set(&self, name: &str, value: Value<MemoryObject>) {
        upsert(&mut self.0.borrow_mut().properties, name, value);
    }

    /// Children in composition order
    pub fn children(&self) -> Vec<MemoryObject> {
        self.0
            .borrow()
            .children
            .iter()
            .map(|slot| slot.object.clone())
            .collect()
    }

    /// Value of a child property on the relationship between `self` and `child`
    pub fn child_property(&self, child: &MemoryObject, name: &str) -> Option<Value<MemoryObject>> {
        let data = self.0.borrow();
        let slot = data.children.iter().find(|s| s.object.ptr_eq(child))?;
        slot.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Number of callbacks connected to `event`
    pub fn handler_count(&self, event: &str) -> usize {
        self.0
            .borrow()
            .handlers
            .iter()
            .filter(|(e, _)| e == event)
            .count()
    }

    /// Invoke every callback connected to `event`, returning how many ran
    pub fn emit(&self, event: &str) -> usize {
        let callbacks: Vec<MemoryCallback> = self
            .0
            .borrow()
            .handlers
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in &callbacks {
            cb(self);
        }
        callbacks.len()
    }

    /// Render the object tree as indented text
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.write_tree(0, None, &mut out);
        out
    }

    fn write_tree(
        &self,
        depth: usize,
        packing: Option<&[(String, Value<MemoryObject>)]>,
        out: &mut String,
    ) {
        let data = self.0.borrow();
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push_str(&data.ty.class());
        if let Some(packing) = packing.filter(|p| !p.is_empty()) {
            let rendered: Vec<String> = packing
                .iter()
                .map(|(n, v)| format!("{} = {}", n, render_value(v)))
                .collect();
            out.push_str(&format!(" [{}]", rendered.join(", ")));
        }
        out.push('\n');
        for (name, value) in &data.properties {
            out.push_str(&format!("{}  .{} = {}\n", indent, name, render_value(value)));
        }
        for slot in &data.children {
            slot.object
                .write_tree(depth + 1, Some(&slot.properties), out);
        }
    }
}

fn render_value(value: &Value<MemoryObject>) -> String {
    match value {
        Value::Literal(l) => l.to_string(),
        Value::Object(o) => format!("<{}>", o.class()),
    }
}

impl PartialEq for MemoryObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MemoryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryObject({})", self.class())
    }
}

/// TOML structure for deserializing type declarations
#[derive(Deserialize)]
struct TomlObjects {
    #[serde(default)]
    permissive: bool,
    #[serde(default)]
    types: HashMap<String, HashMap<String, TypeSpec>>,
    #[serde(default)]
    enums: HashMap<String, EnumSpec>,
}

/// The in-memory object system
#[derive(Debug, Default)]
pub struct MemoryObjects {
    types: HashMap<(String, String), Arc<MemoryType>>,
    enums: HashMap<String, EnumSpec>,
    permissive: bool,
}

impl MemoryObjects {
    /// An object system that only knows explicitly declared types
    pub fn new() -> Self {
        Self::default()
    }

    /// An object system that accepts every type name as a container with
    /// unrestricted properties
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    /// Declare a type
    pub fn with_type(mut self, namespace: &str, name: &str, spec: TypeSpec) -> Self {
        self.declare(namespace, name, spec);
        self
    }

    /// Declare an enumeration for properties called `property`
    pub fn with_enum<I, S>(mut self, property: &str, enum_name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enums.insert(
            property.to_string(),
            EnumSpec {
                name: enum_name.to_string(),
                members: members.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    fn declare(&mut self, namespace: &str, name: &str, spec: TypeSpec) {
        self.types.insert(
            (namespace.to_string(), name.to_string()),
            Arc::new(MemoryType {
                namespace: namespace.to_string(),
                name: name.to_string(),
                spec,
            }),
        );
    }

    /// Load declarations from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load declarations from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlObjects = toml::from_str(content)?;

        let mut objects = Self {
            permissive: parsed.permissive,
            enums: parsed.enums,
            ..Self::default()
        };
        for (namespace, types) in parsed.types {
            for (name, spec) in types {
                objects.declare(&namespace, &name, spec);
            }
        }
        Ok(objects)
    }
}

impl ObjectSystem for MemoryObjects {
    type Type = Arc<MemoryType>;
    type Object = MemoryObject;
    type Callback = MemoryCallback;
    type Error = MemoryError;

    fn lookup_type(&self, namespace: &str, name: &str) -> Option<Self::Type> {
        let key = (namespace.to_string(), name.to_string());
        if let Some(ty) = self.types.get(&key) {
            return Some(ty.clone());
        }
        self.permissive.then(|| {
            Arc::new(MemoryType {
                namespace: key.0,
                name: key.1,
                spec: TypeSpec::permissive(),
            })
        })
    }

    fn construct(&self, ty: &Self::Type) -> Result<Self::Object, Self::Error> {
        if ty.spec.is_abstract {
            return Err(MemoryError::Abstract { class: ty.class() });
        }
        Ok(MemoryObject::new(ty.clone()))
    }

    fn set_property(
        &self,
        object: &Self::Object,
        name: &str,
        value: Value<Self::Object>,
    ) -> Result<(), Self::Error> {
        let mut data = object.0.borrow_mut();
        if let Some(allowed) = &data.ty.spec.properties {
            if !allowed.contains(name) {
                return Err(MemoryError::UnknownProperty {
                    class: data.ty.class(),
                    property: name.to_string(),
                });
            }
        }
        upsert(&mut data.properties, name, value);
        Ok(())
    }

    fn compose(&self, parent: &Self::Object, child: &Self::Object) -> Result<(), Self::Error> {
        if !parent.0.borrow().ty.spec.container {
            return Err(MemoryError::NotAContainer {
                class: parent.class(),
            });
        }
        {
            let mut child_data = child.0.borrow_mut();
            if child_data.has_parent {
                return Err(MemoryError::AlreadyParented {
                    class: child_data.ty.class(),
                });
            }
            child_data.has_parent = true;
        }
        parent.0.borrow_mut().children.push(ChildSlot {
            object: child.clone(),
            properties: Vec::new(),
        });
        Ok(())
    }

    fn set_child_property(
        &self,
        parent: &Self::Object,
        child: &Self::Object,
        name: &str,
        value: Value<Self::Object>,
    ) -> Result<(), Self::Error> {
        let mut data = parent.0.borrow_mut();
        let parent_class = data.ty.class();
        match data.children.iter_mut().find(|s| s.object.ptr_eq(child)) {
            Some(slot) => {
                upsert(&mut slot.properties, name, value);
                Ok(())
            }
            None => Err(MemoryError::NotAChild {
                parent: parent_class,
                child: child.class(),
            }),
        }
    }

    fn connect(
        &self,
        object: &Self::Object,
        event: &str,
        callback: Self::Callback,
    ) -> Result<(), Self::Error> {
        let mut data = object.0.borrow_mut();
        if let Some(allowed) = &data.ty.spec.signals {
            if !allowed.contains(event) {
                return Err(MemoryError::UnknownSignal {
                    class: data.ty.class(),
                    event: event.to_string(),
                });
            }
        }
        data.handlers.push((event.to_string(), callback));
        Ok(())
    }

    fn is_enum_property(&self, property: &str) -> bool {
        self.enums.contains_key(property)
    }

    fn enum_member(&self, property: &str, member: &str) -> Option<EnumValue> {
        let spec = self.enums.get(property)?;
        spec.members
            .iter()
            .position(|m| m.eq_ignore_ascii_case(member))
            .map(|idx| EnumValue::new(&spec.name, member.to_ascii_uppercase(), idx as i64))
    }

    fn is_reference_property(&self, owner: Option<&Self::Type>, property: &str) -> bool {
        owner.is_some_and(|ty| ty.spec.references.contains(property))
    }
}
