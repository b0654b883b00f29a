//! Connecting template signal bindings to caller-supplied handlers

use std::collections::HashMap;

use tracing::debug;

use crate::object::ObjectSystem;
use crate::runtime::Instance;

/// Handlers looked up by name on some caller-defined object
pub trait NamedHandlers<C> {
    /// The callback for `name`, if this object provides one
    fn handler(&self, name: &str) -> Option<C>;
}

/// Where handler names are resolved
pub enum HandlerSet<'a, C> {
    /// Key lookup in a map
    Keyed(&'a HashMap<String, C>),
    /// Member lookup on a handler object
    Named(&'a dyn NamedHandlers<C>),
}

impl<C: Clone> HandlerSet<'_, C> {
    pub fn resolve(&self, name: &str) -> Option<C> {
        match self {
            HandlerSet::Keyed(map) => map.get(name).cloned(),
            HandlerSet::Named(handlers) => handlers.handler(name),
        }
    }
}

impl<'a, C> From<&'a HashMap<String, C>> for HandlerSet<'a, C> {
    fn from(map: &'a HashMap<String, C>) -> Self {
        HandlerSet::Keyed(map)
    }
}

/// Connect every signal binding in an instance's template tree.
///
/// Walks depth-first in document order. Handler names the set does not
/// resolve are skipped. Returns the number of connections made.
pub fn bind_handlers<S: ObjectSystem>(
    objects: &S,
    instance: &Instance<S>,
    handlers: &HandlerSet<'_, S::Callback>,
) -> Result<usize, S::Error> {
    let mut bindings = Vec::new();
    instance.template().walk(&mut |template| {
        for signal in &template.signals {
            bindings.push((template.id.as_str(), signal));
        }
    });

    let mut connected = 0;
    for (id, signal) in bindings {
        let Some(object) = instance.get(id) else {
            debug!(id, "no object for template, skipping its signals");
            continue;
        };
        match handlers.resolve(&signal.handler) {
            Some(callback) => {
                objects.connect(object, &signal.event, callback)?;
                debug!(id, event = %signal.event, handler = %signal.handler, "connected");
                connected += 1;
            }
            None => debug!(id, event = %signal.event, handler = %signal.handler, "no such handler"),
        }
    }
    Ok(connected)
}
