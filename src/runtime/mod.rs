//! Instantiation: templates to live object graphs
//!
//! Every call walks one template tree in document order with its own
//! [`Registry`]. Objects are registered as soon as they are constructed, so a
//! property may reference its own object or any ancestor. A reference to an
//! object that comes later in the document builds that object's subtree
//! ahead of time; the ordinary walk then reuses it instead of constructing it
//! again.

mod error;
mod registry;

pub use error::InstantiateError;
pub use registry::Registry;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::coerce::{CoerceError, Coerced, Coercer, Owner};
use crate::config::BuilderConfig;
use crate::object::ObjectSystem;
use crate::template::{PropertyDescriptor, Template, TemplateSet};
use crate::value::Value;

/// The result of one instantiation: the root object and everything built with it
pub struct Instance<S: ObjectSystem> {
    object: S::Object,
    registry: Registry<S::Object>,
    template: Arc<Template<S::Type>>,
}

impl<S: ObjectSystem> Instance<S> {
    /// The root object
    pub fn object(&self) -> &S::Object {
        &self.object
    }

    /// Object built for `id` in this instantiation
    pub fn get(&self, id: &str) -> Option<&S::Object> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &Registry<S::Object> {
        &self.registry
    }

    /// The template the root was built from
    pub fn template(&self) -> &Arc<Template<S::Type>> {
        &self.template
    }

    pub fn into_object(self) -> S::Object {
        self.object
    }

    pub fn into_parts(self) -> (S::Object, Registry<S::Object>) {
        (self.object, self.registry)
    }
}

impl<S: ObjectSystem> fmt::Debug for Instance<S>
where
    S::Object: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.template.id)
            .field("object", &self.object)
            .field("registry", &self.registry.ids().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds objects from the templates of one compilation unit
pub struct Runtime<'a, S: ObjectSystem> {
    objects: &'a S,
    templates: &'a TemplateSet<S::Type>,
    config: &'a BuilderConfig,
}

impl<'a, S: ObjectSystem> Runtime<'a, S> {
    pub fn new(objects: &'a S, templates: &'a TemplateSet<S::Type>, config: &'a BuilderConfig) -> Self {
        Self {
            objects,
            templates,
            config,
        }
    }

    /// Build a fresh object graph with its own registry
    pub fn instantiate(
        &self,
        template: &Arc<Template<S::Type>>,
    ) -> Result<Instance<S>, InstantiateError<S::Error>> {
        let mut registry = Registry::new();
        let object = self.instantiate_into(template, &mut registry)?;
        debug!(id = %template.id, objects = registry.len(), "instantiated");
        Ok(Instance {
            object,
            registry,
            template: template.clone(),
        })
    }

    /// Build an object graph, registering every object in `registry`.
    ///
    /// Fails with [`InstantiateError::AlreadyRegistered`] if the registry
    /// already holds an id this walk has to construct. Nothing is rolled back
    /// on failure.
    pub fn instantiate_into(
        &self,
        template: &Template<S::Type>,
        registry: &mut Registry<S::Object>,
    ) -> Result<S::Object, InstantiateError<S::Error>> {
        let mut walk = Walk {
            objects: self.objects,
            templates: self.templates,
            coercer: Coercer::new(self.objects, self.config),
            registry,
            pending: Vec::new(),
            deferred: HashSet::new(),
        };
        walk.build(template)
    }
}

/// State of one instantiation call
struct Walk<'a, 'r, S: ObjectSystem> {
    objects: &'a S,
    templates: &'a TemplateSet<S::Type>,
    coercer: Coercer<'a, S>,
    registry: &'r mut Registry<S::Object>,
    /// Ids whose on-demand construction is in progress, outermost first
    pending: Vec<String>,
    /// Ids built on demand, reused when the walk reaches them in document order
    deferred: HashSet<String>,
}

impl<S: ObjectSystem> Walk<'_, '_, S> {
    fn build(&mut self, template: &Template<S::Type>) -> Result<S::Object, InstantiateError<S::Error>> {
        let id = template.id.as_str();
        if self.deferred.remove(id) {
            return match self.registry.get(id) {
                Some(object) => {
                    trace!(id, "reusing object built ahead of document order");
                    Ok(object.clone())
                }
                // construction of this id has started but not returned
                None => {
                    let start = self.pending.iter().position(|p| p == id).unwrap_or(0);
                    let mut chain = self.pending[start..].to_vec();
                    chain.push(id.to_string());
                    Err(InstantiateError::CircularReference { chain })
                }
            };
        }
        if self.registry.contains(id) {
            return Err(InstantiateError::AlreadyRegistered { id: id.to_string() });
        }
        self.construct(template)
    }

    fn construct(&mut self, template: &Template<S::Type>) -> Result<S::Object, InstantiateError<S::Error>> {
        let id = template.id.as_str();
        let object = self
            .objects
            .construct(&template.resolved)
            .map_err(InstantiateError::ObjectSystem)?;
        self.registry.insert(id, object.clone());
        debug!(id, class = %template.class, "constructed object");

        let owner = Owner {
            class: &template.class,
            ty: &template.resolved,
        };
        for property in &template.properties {
            let value = self.value(property, Some(owner), id)?;
            self.objects
                .set_property(&object, &property.name, value)
                .map_err(InstantiateError::ObjectSystem)?;
        }

        for child in &template.children {
            let child_object = self.build(&child.template)?;
            self.objects
                .compose(&object, &child_object)
                .map_err(InstantiateError::ObjectSystem)?;
            for property in &child.packing {
                let coerced = self
                    .coercer
                    .coerce_packing(&property.raw, &template.class, &property.name);
                let value = self.resolve(property, coerced, &child.template.id)?;
                self.objects
                    .set_child_property(&object, &child_object, &property.name, value)
                    .map_err(InstantiateError::ObjectSystem)?;
            }
        }

        Ok(object)
    }

    fn value(
        &mut self,
        property: &PropertyDescriptor,
        owner: Option<Owner<'_, S::Type>>,
        requester: &str,
    ) -> Result<Value<S::Object>, InstantiateError<S::Error>> {
        let coerced = self.coercer.coerce(&property.raw, owner, &property.name);
        self.resolve(property, coerced, requester)
    }

    fn resolve(
        &mut self,
        property: &PropertyDescriptor,
        coerced: Result<Coerced, CoerceError>,
        requester: &str,
    ) -> Result<Value<S::Object>, InstantiateError<S::Error>> {
        match coerced.map_err(|e| InstantiateError::invalid_value(&property.name, &property.raw, e))? {
            Coerced::Literal(literal) => Ok(Value::Literal(literal)),
            Coerced::Reference(id) => self
                .reference(&id, &property.name, requester)
                .map(Value::Object),
        }
    }

    /// Resolve a cross-reference, building the target on demand.
    ///
    /// Any registered id resolves to its object, finished or not. An id built
    /// here is marked deferred before its construction starts, so the walk
    /// that later reaches it in document order reuses it, even when that walk
    /// is itself part of this construction.
    fn reference(
        &mut self,
        id: &str,
        property: &str,
        requester: &str,
    ) -> Result<S::Object, InstantiateError<S::Error>> {
        if let Some(object) = self.registry.get(id) {
            return Ok(object.clone());
        }

        let templates = self.templates;
        let template = templates
            .get(id)
            .ok_or_else(|| InstantiateError::missing_reference(id, property, requester))?;

        debug!(id, property, requester, "building referenced object ahead of document order");
        self.deferred.insert(id.to_string());
        self.pending.push(id.to_string());
        let built = self.construct(template);
        self.pending.pop();
        built
    }
}
